//! Directory-aware prefix completion.
//!
//! Completion never fails: an unknown prefix, a missing directory or a failed
//! tree query all produce an empty candidate list.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::core::error::LedgerResult;
use crate::core::layout::PathLayout;
use crate::core::repo::{CommitId, EntryKind, UpstreamRepo};
use crate::core::translate::is_path;

/// Subcommands offered at the first argument position
pub const ACTIONS: [&str; 3] = ["add", "modify", "sort"];

pub fn complete_actions(partial: &str) -> Vec<String>
{
    complete_words(partial, ACTIONS)
}

pub fn complete_tags(
    partial: &str,
    tags: &[String],
) -> Vec<String>
{
    complete_words(partial, tags.iter())
}

fn complete_words<I, S>(
    partial: &str,
    words: I,
) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .filter(|w| {
            w.as_ref()
                .starts_with(partial)
        })
        .map(|w| {
            w.as_ref()
                .to_string()
        })
        .collect()
}

/// Complete `partial` against a flat list of known file paths.
///
/// An exact match is returned alone. Otherwise each known path starting with
/// `partial` contributes its next segment below the directory `partial`
/// points into; segments that are not the final one get a trailing `/`.
pub fn complete_against_known_paths<'a, I>(
    partial: &str,
    known_paths: I,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let matches: Vec<&str> = known_paths
        .into_iter()
        .filter(|p| p.starts_with(partial))
        .collect();

    if matches.contains(&partial)
    {
        return BTreeSet::from([partial.to_string()]);
    }

    let parent = if partial.ends_with('/')
    {
        partial.trim_end_matches('/')
    }
    else
    {
        partial
            .rsplit_once('/')
            .map_or("", |(parent, _)| parent)
    };
    let depth = segments(parent).count();

    let mut result = BTreeSet::new();
    for path in matches
    {
        let Some(child) = segments(path).nth(depth)
        else
        {
            continue;
        };
        let mut candidate = if parent.is_empty() { child.to_string() } else { format!("{parent}/{child}") };
        if candidate != path
        {
            candidate.push('/');
        }
        result.insert(candidate);
    }
    result
}

fn segments(path: &str) -> impl Iterator<Item = &str>
{
    path.split('/')
        .filter(|s| !s.is_empty())
}

/// Complete a partial dotted class name against known destination paths,
/// under the destination main root first, then the test root.
pub fn complete_known_class_names<'a, I>(
    partial: &str,
    known_paths: I,
    layout: &PathLayout,
) -> Vec<String>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    if is_path(partial)
    {
        return Vec::new();
    }

    let relative = partial.replace('.', "/");
    let mut result = Vec::new();
    for root in layout.destination_roots()
    {
        let prefix = format!("{root}{relative}");
        result.extend(
            complete_against_known_paths(&prefix, known_paths.clone())
                .iter()
                .filter_map(|path| path.strip_prefix(root))
                .map(|rel| layout.relative_to_class(rel)),
        );
    }
    result
}

/// Complete `partial` against the tree of `commit`.
///
/// An existing file is returned alone. An existing directory lists all its
/// children; otherwise the children of the parent directory whose names
/// start with the last segment are listed. Directories get a trailing `/`.
/// Paths in `excluded` are never returned.
pub fn complete_against_tree(
    partial: &str,
    repo: &dyn UpstreamRepo,
    commit: &CommitId,
    excluded: &HashSet<&str>,
) -> Vec<String>
{
    match tree_candidates(partial, repo, commit, excluded)
    {
        Ok(found) => found,
        Err(err) =>
        {
            debug!(%err, partial, "tree completion failed");
            Vec::new()
        }
    }
}

fn tree_candidates(
    partial: &str,
    repo: &dyn UpstreamRepo,
    commit: &CommitId,
    excluded: &HashSet<&str>,
) -> LedgerResult<Vec<String>>
{
    let normalized = partial.trim_end_matches('/');

    let (dir, word) = match repo.kind(commit, normalized)?
    {
        Some(EntryKind::File) =>
        {
            let found = (!excluded.contains(normalized)).then(|| normalized.to_string());
            return Ok(found
                .into_iter()
                .collect());
        }
        Some(EntryKind::Directory) => (normalized, ""),
        None => match normalized.rsplit_once('/')
        {
            Some((parent, word)) =>
            {
                if repo.kind(commit, parent)? != Some(EntryKind::Directory)
                {
                    return Ok(Vec::new());
                }
                (parent, word)
            }
            None => ("", normalized),
        },
    };

    Ok(repo
        .list_children(commit, dir)?
        .into_iter()
        .filter(|child| {
            child
                .name()
                .starts_with(word)
                && !excluded.contains(child.path.as_str())
        })
        .map(|child| match child.kind
        {
            EntryKind::Directory => format!("{}/", child.path),
            EntryKind::File => child.path,
        })
        .collect())
}

/// Complete a partial dotted class name against every upstream search root.
pub fn complete_upstream_class_names(
    partial: &str,
    repo: &dyn UpstreamRepo,
    commit: &CommitId,
    excluded: &HashSet<&str>,
    layout: &PathLayout,
) -> Vec<String>
{
    if is_path(partial)
    {
        return Vec::new();
    }

    let relative = partial.replace('.', "/");
    let mut result = Vec::new();
    for root in layout.upstream_search_roots()
    {
        let prefix = format!("{root}{relative}");
        result.extend(
            complete_against_tree(&prefix, repo, commit, excluded)
                .iter()
                .filter_map(|path| path.strip_prefix(root))
                .map(|rel| layout.relative_to_class(rel)),
        );
    }
    result
}
