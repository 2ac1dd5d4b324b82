//! Read-only access to upstream commits.
//!
//! The editor only needs three queries against an immutable snapshot: resolve
//! a reference, ask whether a path is a file or directory, and list the
//! children of a directory. `GitRepo` answers them by running the `git`
//! executable; `MemoryRepo` answers them from a fixed in-memory file list
//! and `EmptyRepo` has no commits at all.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Output};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, trace};

use crate::core::error::{LedgerError, LedgerResult};

/// A resolved, immutable commit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(String);

impl CommitId
{
    pub fn as_str(&self) -> &str
    {
        &self.0
    }
}

impl fmt::Display for CommitId
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

/// Tree entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind
{
    Directory,
    File,
}

/// Immediate child of a directory, addressed by its full path from the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeChild
{
    pub path: String,
    pub kind: EntryKind,
}

impl TreeChild
{
    /// Final path segment
    pub fn name(&self) -> &str
    {
        self.path
            .rsplit('/')
            .next()
            .unwrap_or(&self.path)
    }
}

/// Narrow read-only view of an upstream repository
pub trait UpstreamRepo
{
    /// Resolve a tag or commit string; `None` when it names no commit.
    fn resolve(
        &self,
        reference: &str,
    ) -> LedgerResult<Option<CommitId>>;

    /// Kind of the entry at `path` (`""` is the root), `None` when absent.
    fn kind(
        &self,
        commit: &CommitId,
        path: &str,
    ) -> LedgerResult<Option<EntryKind>>;

    /// Immediate children of `dir`: directories first, then files.
    /// Empty when `dir` is not a directory.
    fn list_children(
        &self,
        commit: &CommitId,
        dir: &str,
    ) -> LedgerResult<Vec<TreeChild>>;

    /// Whether `path` names a file; directories are not source paths.
    fn is_file(
        &self,
        commit: &CommitId,
        path: &str,
    ) -> LedgerResult<bool>
    {
        Ok(self.kind(commit, path)? == Some(EntryKind::File))
    }
}

/// Strip surrounding separators so `a/b/` and `a/b` address the same entry.
fn normalize(path: &str) -> &str
{
    path.trim_matches('/')
}

/// Upstream repository backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitRepo
{
    root: Utf8PathBuf,
    git_executable: PathBuf,
}

impl GitRepo
{
    /// Open the repository at `root`, failing when git or the repo is missing.
    pub fn open(root: &Utf8Path) -> LedgerResult<Self>
    {
        let repo = Self { root: root.to_path_buf(), git_executable: detect_git_executable()? };

        let output = repo.run(&["rev-parse", "--git-dir"])?;
        if !output
            .status
            .success()
        {
            return Err(LedgerError::Git {
                command: "rev-parse --git-dir".into(),
                message: format!("{} is not a git repository", root),
            });
        }

        debug!(root = %repo.root, "opened upstream repository");
        Ok(repo)
    }

    pub fn root(&self) -> &Utf8Path
    {
        &self.root
    }

    fn run(
        &self,
        args: &[&str],
    ) -> LedgerResult<Output>
    {
        trace!(?args, "git");
        Command::new(&self.git_executable)
            .arg("-C")
            .arg(self.root.as_std_path())
            .args(args)
            .output()
            .map_err(|e| LedgerError::Git { command: args.join(" "), message: e.to_string() })
    }
}

/// Detect the git executable on PATH
fn detect_git_executable() -> LedgerResult<PathBuf>
{
    let output = Command::new("git")
        .arg("--version")
        .output()
        .map_err(|e| LedgerError::Git {
            command: "--version".into(),
            message: format!("git executable not found in PATH: {e}"),
        })?;

    let version = String::from_utf8_lossy(&output.stdout);
    if !output
        .status
        .success()
        || !version.contains("git version")
    {
        return Err(LedgerError::Git {
            command: "--version".into(),
            message: format!("unexpected output: {}", version.trim()),
        });
    }

    Ok(PathBuf::from("git"))
}

impl UpstreamRepo for GitRepo
{
    fn resolve(
        &self,
        reference: &str,
    ) -> LedgerResult<Option<CommitId>>
    {
        // Leading '-' would be read as an option
        if reference.is_empty() || reference.starts_with('-')
        {
            return Ok(None);
        }

        let rev = format!("{reference}^{{commit}}");
        let output = self.run(&["rev-parse", "--verify", "--quiet", &rev])?;
        if !output
            .status
            .success()
        {
            return Ok(None);
        }

        let sha = String::from_utf8_lossy(&output.stdout)
            .trim()
            .to_string();
        Ok((!sha.is_empty()).then_some(CommitId(sha)))
    }

    fn kind(
        &self,
        commit: &CommitId,
        path: &str,
    ) -> LedgerResult<Option<EntryKind>>
    {
        let path = normalize(path);
        if path.is_empty()
        {
            return Ok(Some(EntryKind::Directory));
        }

        let object = format!("{commit}:{path}");
        let output = self.run(&["cat-file", "-t", &object])?;
        if !output
            .status
            .success()
        {
            return Ok(None);
        }

        let kind = match String::from_utf8_lossy(&output.stdout).trim()
        {
            "tree" => EntryKind::Directory,
            // Blobs and submodule links are both leaves
            _ => EntryKind::File,
        };
        Ok(Some(kind))
    }

    fn list_children(
        &self,
        commit: &CommitId,
        dir: &str,
    ) -> LedgerResult<Vec<TreeChild>>
    {
        let dir = normalize(dir);
        let tree = format!("{commit}:{dir}");
        let output = self.run(&["ls-tree", "-z", &tree])?;
        if !output
            .status
            .success()
        {
            return Ok(Vec::new());
        }

        Ok(parse_ls_tree(&String::from_utf8_lossy(&output.stdout), dir))
    }
}

/// Parse `ls-tree -z` records (`<mode> <type> <object>\t<name>\0`).
fn parse_ls_tree(
    stdout: &str,
    dir: &str,
) -> Vec<TreeChild>
{
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for record in stdout
        .split('\0')
        .filter(|r| !r.is_empty())
    {
        let Some((meta, name)) = record.split_once('\t')
        else
        {
            continue;
        };
        let path = if dir.is_empty() { name.to_string() } else { format!("{dir}/{name}") };

        match meta
            .split(' ')
            .nth(1)
        {
            Some("tree") => dirs.push(TreeChild { path, kind: EntryKind::Directory }),
            Some(_) => files.push(TreeChild { path, kind: EntryKind::File }),
            None => continue,
        }
    }

    dirs.extend(files);
    dirs
}

/// Repository with no commits, for commands that never consult upstream
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRepo;

impl UpstreamRepo for EmptyRepo
{
    fn resolve(
        &self,
        _reference: &str,
    ) -> LedgerResult<Option<CommitId>>
    {
        Ok(None)
    }

    fn kind(
        &self,
        _commit: &CommitId,
        _path: &str,
    ) -> LedgerResult<Option<EntryKind>>
    {
        Ok(None)
    }

    fn list_children(
        &self,
        _commit: &CommitId,
        _dir: &str,
    ) -> LedgerResult<Vec<TreeChild>>
    {
        Ok(Vec::new())
    }
}

/// In-memory upstream repository: references mapped to file lists.
/// Backs the unit tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo
{
    references: BTreeMap<String, CommitId>,
    snapshots: BTreeMap<CommitId, BTreeSet<String>>,
}

impl MemoryRepo
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Add a commit reachable through `reference` containing `files`.
    pub fn with_commit<I, S>(
        mut self,
        reference: &str,
        files: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = CommitId(format!("{:040x}", self.snapshots.len() + 1));
        self.snapshots
            .insert(
                id.clone(),
                files
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            );
        self.references
            .insert(reference.to_string(), id);
        self
    }

    fn files(
        &self,
        commit: &CommitId,
    ) -> impl Iterator<Item = &str>
    {
        self.snapshots
            .get(commit)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}

impl UpstreamRepo for MemoryRepo
{
    fn resolve(
        &self,
        reference: &str,
    ) -> LedgerResult<Option<CommitId>>
    {
        Ok(self
            .references
            .get(reference)
            .cloned())
    }

    fn kind(
        &self,
        commit: &CommitId,
        path: &str,
    ) -> LedgerResult<Option<EntryKind>>
    {
        let path = normalize(path);
        if path.is_empty()
        {
            return Ok(Some(EntryKind::Directory));
        }

        let dir_prefix = format!("{path}/");
        let mut kind = None;
        for file in self.files(commit)
        {
            if file == path
            {
                return Ok(Some(EntryKind::File));
            }
            if file.starts_with(&dir_prefix)
            {
                kind = Some(EntryKind::Directory);
            }
        }
        Ok(kind)
    }

    fn list_children(
        &self,
        commit: &CommitId,
        dir: &str,
    ) -> LedgerResult<Vec<TreeChild>>
    {
        let dir = normalize(dir);
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };

        let mut dirs = BTreeSet::new();
        let mut files = BTreeSet::new();
        for rest in self
            .files(commit)
            .filter_map(|f| f.strip_prefix(prefix.as_str()))
        {
            match rest.split_once('/')
            {
                Some((child, _)) => dirs.insert(format!("{prefix}{child}")),
                None => files.insert(format!("{prefix}{rest}")),
            };
        }

        Ok(dirs
            .into_iter()
            .map(|path| TreeChild { path, kind: EntryKind::Directory })
            .chain(
                files
                    .into_iter()
                    .map(|path| TreeChild { path, kind: EntryKind::File }),
            )
            .collect())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn repo() -> (MemoryRepo, CommitId)
    {
        let repo = MemoryRepo::new().with_commit(
            "jdk11u/jdk-11+28",
            ["src/java.base/share/classes/java/util/List.java", "src/java.base/share/classes/java/util/Map.java", "README"],
        );
        let commit = repo
            .resolve("jdk11u/jdk-11+28")
            .unwrap()
            .unwrap();
        (repo, commit)
    }

    #[test]
    fn memory_repo_kinds()
    {
        let (repo, commit) = repo();
        assert_eq!(repo.kind(&commit, "").unwrap(), Some(EntryKind::Directory));
        assert_eq!(repo.kind(&commit, "src/java.base/").unwrap(), Some(EntryKind::Directory));
        assert_eq!(repo.kind(&commit, "README").unwrap(), Some(EntryKind::File));
        assert_eq!(repo.kind(&commit, "src/java").unwrap(), None);
        assert!(
            !repo
                .is_file(&commit, "src/java.base/share/classes/java/util/Set.java")
                .unwrap()
        );
        assert!(
            !repo
                .is_file(&commit, "src/java.base")
                .unwrap()
        );
    }

    #[test]
    fn empty_repo_resolves_nothing()
    {
        assert_eq!(EmptyRepo.resolve("jdk11u/jdk-11+28").unwrap(), None);
        let commit = CommitId("0".repeat(40));
        assert!(!EmptyRepo.is_file(&commit, "a/B.java").unwrap());
        assert!(EmptyRepo.list_children(&commit, "").unwrap().is_empty());
    }

    #[test]
    fn memory_repo_lists_directories_before_files()
    {
        let (repo, commit) = repo();
        let root = repo
            .list_children(&commit, "")
            .unwrap();
        assert_eq!(
            root,
            vec![
                TreeChild { path: "src".into(), kind: EntryKind::Directory },
                TreeChild { path: "README".into(), kind: EntryKind::File },
            ]
        );

        let util = repo
            .list_children(&commit, "src/java.base/share/classes/java/util")
            .unwrap();
        let names: Vec<&str> = util
            .iter()
            .map(TreeChild::name)
            .collect();
        assert_eq!(names, ["List.java", "Map.java"]);
    }

    #[test]
    fn memory_repo_unknown_reference()
    {
        let (repo, _) = repo();
        assert_eq!(
            repo.resolve("jdk9/jdk-9+181")
                .unwrap(),
            None
        );
    }

    #[test]
    fn ls_tree_output_is_split_by_kind()
    {
        let out = "100644 blob aaaa\tFoo.java\0040000 tree bbbb\tsub\0160000 commit cccc\tmodule\0";
        let children = parse_ls_tree(out, "java/util");
        assert_eq!(
            children,
            vec![
                TreeChild { path: "java/util/sub".into(), kind: EntryKind::Directory },
                TreeChild { path: "java/util/Foo.java".into(), kind: EntryKind::File },
                TreeChild { path: "java/util/module".into(), kind: EntryKind::File },
            ]
        );
    }
}
