//! Error taxonomy for ledger editing.
//!
//! Every variant is reported to the user as-is and maps to exit code 1.
//! None of them are retried, and all are raised before the ledger is written.

use std::path::PathBuf;

use itertools::Itertools;

/// Typed failures of the ledger editor
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The tag or commit string does not name a commit
    #[error("{reference} is not a valid tag or commit")]
    UnresolvableReference { reference: String },

    /// The source path is absent from the resolved commit
    #[error("{path} is not found in {reference}{}", render_searched(.searched))]
    PathNotFound { path: String, reference: String, searched: Vec<String> },

    /// An entry with this destination path already exists
    #[error("Can't add the file {destination} because {source_path} exists in the EXPECTED_UPSTREAM")]
    DuplicateDestination { destination: String, source_path: String },

    /// No entry has this destination path
    #[error("{destination} is not found in the EXPECTED_UPSTREAM")]
    EntryNotFound { destination: String },

    /// A record line does not hold three non-empty fields
    #[error("line {line_number}: the size must be 3 non-empty fields, but is {fields}. The line is '{line}'")]
    MalformedLedgerLine { line_number: usize, fields: usize, line: String },

    /// No destination was given and none could be guessed
    #[error("The ojluni destination path is not given and can't be guessed from {source_path}")]
    DestinationRequired { source_path: String },

    /// No source path was given and none could be guessed
    #[error("[source_file] argument is required for {destination}")]
    SourcePathRequired { destination: String },

    /// Reading or writing a local file failed
    #[error("cannot access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The git executable failed or produced unusable output
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },
}

/// Result alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError
{
    /// Wrap an I/O error with the path it concerns.
    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self
    {
        Self::Io { path: path.into(), source }
    }
}

fn render_searched(searched: &[String]) -> String
{
    if searched.is_empty()
    {
        return String::new();
    }

    format!(
        ". The search paths are:\n  {}",
        searched
            .iter()
            .join("\n  ")
    )
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn path_not_found_lists_search_paths_in_order()
    {
        let err = LedgerError::PathNotFound {
            path: "java.lang.Foo".into(),
            reference: "jdk9/jdk-9+181".into(),
            searched: vec![
                "jdk/src/share/classes/java/lang/Foo.java".into(),
                "test/jdk/java/lang/Foo.java".into(),
            ],
        };

        let msg = err.to_string();
        assert!(msg.starts_with("java.lang.Foo is not found in jdk9/jdk-9+181"));
        let first = msg
            .find("jdk/src/share")
            .unwrap();
        let second = msg
            .find("test/jdk/java")
            .unwrap();
        assert!(first < second);
    }

    #[test]
    fn path_not_found_without_search_list_is_one_line()
    {
        let err = LedgerError::PathNotFound {
            path: "a/B.java".into(),
            reference: "tag".into(),
            searched: Vec::new(),
        };
        assert_eq!(err.to_string(), "a/B.java is not found in tag");
    }
}
