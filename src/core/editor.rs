//! `add`, `modify`, `sort` and shell autocompletion over the ledger.
//!
//! Every command reads the whole ledger, validates against the upstream
//! repository, and only then rewrites the file. A failed command leaves the
//! ledger untouched.

use std::collections::HashSet;

use camino::Utf8PathBuf;
use indexmap::IndexSet;
use tracing::{debug, info, instrument};

use crate::core::complete::{
    complete_actions, complete_against_known_paths, complete_against_tree, complete_known_class_names,
    complete_tags, complete_upstream_class_names,
};
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::layout::PathLayout;
use crate::core::ledger::{Ledger, LedgerEntry, LedgerFile};
use crate::core::repo::{CommitId, UpstreamRepo};
use crate::core::translate::{Translator, UpstreamLookup};

/// Flag that switches the binary into completion mode
pub const AUTOCOMPLETE_FLAG: &str = "--autocomplete";

const NO_TAGS: &[String] = &[];

/// Global options taking a value; their paths carry into completion mode
const VALUE_FLAGS: [&str; 4] = ["--config", "--repo", "--ledger", "--log-level"];

/// Global switches, skipped in completion mode
const SWITCH_FLAGS: [&str; 3] = ["--no-color", "--quiet", "--dry-run"];

/// A shell completion query: `--autocomplete <index> [globals...] [command] [args...]`.
///
/// `index` is the shell's word index of the argument being completed, so 1 is
/// the subcommand itself, 2 its first positional and so on. Global options
/// typed before the subcommand are removed and `index` is shifted to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest
{
    pub index: usize,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub config: Option<Utf8PathBuf>,
    pub repo: Option<Utf8PathBuf>,
    pub ledger: Option<Utf8PathBuf>,
}

impl CompletionRequest
{
    /// Recognize a completion query in raw arguments (program name excluded).
    /// Returns `None` when the arguments are a normal invocation.
    pub fn from_args(args: &[String]) -> Option<Self>
    {
        let (flag, rest) = args.split_first()?;
        if flag != AUTOCOMPLETE_FLAG
        {
            return None;
        }

        let mut request = Self::default();
        let Some((index, mut words)) = rest.split_first()
        else
        {
            return Some(request);
        };

        let mut skipped = 0;
        loop
        {
            let used = request.take_global(words);
            if used == 0
            {
                break;
            }
            skipped += used;
            words = &words[used.min(words.len())..];
        }

        // An unparsable index, or one pointing into the globals, matches nothing
        request.index = index
            .parse::<usize>()
            .ok()
            .filter(|&i| i > skipped)
            .map_or(0, |i| i - skipped);

        let mut words = words.iter();
        request.command = words
            .next()
            .cloned();
        request.args = words
            .cloned()
            .collect();
        Some(request)
    }

    /// Consume one global option at the start of `words`; returns the number
    /// of words it spans (0 when `words` does not start with one).
    fn take_global(
        &mut self,
        words: &[String],
    ) -> usize
    {
        let Some(word) = words.first()
        else
        {
            return 0;
        };
        if SWITCH_FLAGS.contains(&word.as_str())
        {
            return 1;
        }

        let (flag, inline) = match word.split_once('=')
        {
            Some((flag, value)) => (flag, Some(value)),
            None => (word.as_str(), None),
        };
        if !VALUE_FLAGS.contains(&flag)
        {
            return 0;
        }

        // bash splits `--repo=dir` into `--repo`, `=`, `dir`
        let (value, used) = match (inline, words.get(1).map(String::as_str))
        {
            (Some(value), _) => (Some(value), 1),
            (None, Some("=")) => (words.get(2).map(String::as_str), 3),
            (None, value) => (value, 2),
        };
        let value = value.map(Utf8PathBuf::from);
        match flag
        {
            "--config" => self.config = value,
            "--repo" => self.repo = value,
            "--ledger" => self.ledger = value,
            _ => {}
        }
        used
    }

    fn arg(
        &self,
        position: usize,
    ) -> &str
    {
        self.args
            .get(position)
            .map_or("", String::as_str)
    }
}

/// Ledger editor bound to one ledger file and one upstream repository
pub struct LedgerEditor<'a>
{
    repo: &'a dyn UpstreamRepo,
    layout: &'a PathLayout,
    tags: &'a [String],
    file: LedgerFile,
    dry_run: bool,
}

impl<'a> LedgerEditor<'a>
{
    pub fn new(
        repo: &'a dyn UpstreamRepo,
        layout: &'a PathLayout,
        file: LedgerFile,
    ) -> Self
    {
        Self { repo, layout, tags: NO_TAGS, file, dry_run: false }
    }

    /// Tags offered when completing a tag or commit argument.
    pub fn with_tags(
        mut self,
        tags: &'a [String],
    ) -> Self
    {
        self.tags = tags;
        self
    }

    /// Validate and report, but never write the ledger.
    pub fn with_dry_run(
        mut self,
        dry_run: bool,
    ) -> Self
    {
        self.dry_run = dry_run;
        self
    }

    pub fn file(&self) -> &LedgerFile
    {
        &self.file
    }

    fn translator(&self) -> Translator<'a>
    {
        Translator::new(self.layout)
    }

    fn resolve(
        &self,
        reference: &str,
    ) -> LedgerResult<CommitId>
    {
        self.repo
            .resolve(reference)?
            .ok_or_else(|| LedgerError::UnresolvableReference { reference: reference.to_string() })
    }

    /// Record a new entry for `class_or_path` at `reference`.
    #[instrument(skip(self))]
    pub fn add(
        &self,
        reference: &str,
        class_or_path: &str,
        destination: Option<&str>,
    ) -> LedgerResult<LedgerEntry>
    {
        let ledger = self
            .file
            .read_all()?;
        let commit = self.resolve(reference)?;
        let translator = self.translator();

        let upstream_path = match translator.class_name_to_upstream_path(self.repo, &commit, class_or_path)?
        {
            UpstreamLookup::Found(path) => path,
            UpstreamLookup::Missing { tried } =>
            {
                return Err(LedgerError::PathNotFound {
                    path: class_or_path.to_string(),
                    reference: reference.to_string(),
                    searched: tried,
                });
            }
        };

        let destination = match destination
        {
            Some(given) => translator.class_name_to_destination_path(given),
            None => translator
                .upstream_path_to_destination_guess(&upstream_path)
                .ok_or_else(|| LedgerError::DestinationRequired { source_path: upstream_path.clone() })?,
        };

        if ledger
            .find(&destination)
            .is_some()
        {
            return Err(LedgerError::DuplicateDestination {
                destination,
                source_path: class_or_path.to_string(),
            });
        }

        let entry = LedgerEntry::new(destination, reference, upstream_path);
        if self.dry_run
        {
            debug!("dry run: ledger not written");
        }
        else
        {
            self.file
                .append_and_resort(entry.clone(), Some(ledger))?;
        }

        info!(%entry, "added entry");
        Ok(entry)
    }

    /// Point an existing entry at `reference`, keeping its comment.
    ///
    /// Without `source`, the current upstream path is kept when it is still
    /// a file at the new commit, otherwise one is guessed from the
    /// destination path.
    #[instrument(skip(self))]
    pub fn modify(
        &self,
        class_or_destination: &str,
        reference: &str,
        source: Option<&str>,
    ) -> LedgerResult<LedgerEntry>
    {
        let mut ledger = self
            .file
            .read_all()?;
        let translator = self.translator();
        let destination = translator.class_name_to_destination_path(class_or_destination);

        let current_path = ledger
            .find(&destination)
            .map(|e| e.upstream_path.clone())
            .ok_or_else(|| LedgerError::EntryNotFound { destination: destination.clone() })?;

        let commit = self.resolve(reference)?;
        let upstream_path = match source
        {
            Some(given) =>
            {
                if !self
                    .repo
                    .is_file(&commit, given)?
                {
                    return Err(LedgerError::PathNotFound {
                        path: given.to_string(),
                        reference: reference.to_string(),
                        searched: Vec::new(),
                    });
                }
                given.to_string()
            }
            None =>
            {
                if self
                    .repo
                    .is_file(&commit, &current_path)?
                {
                    current_path
                }
                else
                {
                    translator
                        .destination_path_to_upstream_guess(self.repo, &commit, &destination)?
                        .ok_or_else(|| LedgerError::SourcePathRequired { destination: destination.clone() })?
                }
            }
        };

        let entry = match ledger.find_mut(&destination)
        {
            Some(entry) =>
            {
                entry.upstream_ref = reference.to_string();
                entry.upstream_path = upstream_path;
                entry.clone()
            }
            None => return Err(LedgerError::EntryNotFound { destination }),
        };

        // Destination unchanged, so the order is too
        if !self.dry_run
        {
            self.file
                .write_all(&ledger)?;
        }

        info!(%entry, "modified entry");
        Ok(entry)
    }

    /// Sort and rewrite the ledger; returns the number of entries.
    #[instrument(skip(self))]
    pub fn sort(&self) -> LedgerResult<usize>
    {
        let mut ledger = self
            .file
            .read_all()?;
        if self.dry_run
        {
            ledger.sort();
        }
        else
        {
            ledger = self
                .file
                .sort_and_write(ledger)?;
        }
        Ok(ledger
            .entries
            .len())
    }

    /// Answer a completion query. Never fails; problems yield no candidates.
    #[instrument(skip(self))]
    pub fn autocomplete(
        &self,
        request: &CompletionRequest,
    ) -> Vec<String>
    {
        if request.index == 1
        {
            return complete_actions(
                request
                    .command
                    .as_deref()
                    .unwrap_or(""),
            );
        }

        let ledger = match self
            .file
            .read_all()
        {
            Ok(ledger) => ledger,
            Err(err) =>
            {
                debug!(%err, "completion without ledger");
                return Vec::new();
            }
        };

        let mut found: IndexSet<String> = IndexSet::new();
        match (request.command.as_deref(), request.index)
        {
            (Some("modify"), 2) =>
            {
                let partial = request.arg(0);
                found.extend(complete_against_known_paths(partial, ledger.destinations()));
                found.extend(complete_known_class_names(partial, ledger.destinations(), self.layout));
            }
            (Some("modify"), 3) => found.extend(complete_tags(request.arg(1), self.tags)),
            (Some("add"), 2) => found.extend(complete_tags(request.arg(0), self.tags)),
            (Some("add"), 3) => found.extend(self.complete_upstream(&ledger, request.arg(0), request.arg(1))),
            _ => {}
        }

        found
            .into_iter()
            .collect()
    }

    fn complete_upstream(
        &self,
        ledger: &Ledger,
        reference: &str,
        partial: &str,
    ) -> Vec<String>
    {
        let commit = match self
            .repo
            .resolve(reference)
        {
            Ok(Some(commit)) => commit,
            Ok(None) => return Vec::new(),
            Err(err) =>
            {
                debug!(%err, reference, "cannot resolve for completion");
                return Vec::new();
            }
        };

        let excluded: HashSet<&str> = ledger
            .upstream_paths()
            .collect();
        let mut found = complete_against_tree(partial, self.repo, &commit, &excluded);
        found.extend(complete_upstream_class_names(partial, self.repo, &commit, &excluded, self.layout));
        found
    }
}
