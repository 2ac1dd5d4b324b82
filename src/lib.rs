//! **expected-upstream** - Record and edit the EXPECTED_UPSTREAM provenance ledger
//!
//! Maps each file of the ojluni tree to the upstream OpenJDK tag and path it was
//! taken from. Class names, destination paths and upstream paths are translated
//! into each other, and shell completion is answered from the ledger and from
//! the upstream git history.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core ledger logic - pure over an injected upstream repository
pub mod core {
    /// Typed errors surfaced to the user
    pub mod error;
    pub use error::{LedgerError, LedgerResult};

    /// Ledger file parsing, sorting and atomic rewrites
    pub mod ledger;
    pub use ledger::{Ledger, LedgerEntry, LedgerFile};

    /// Root prefixes of the destination and upstream trees
    pub mod layout;
    pub use layout::{PathLayout, SourceKind};

    /// Read-only upstream commit access (git executable or in-memory)
    pub mod repo;
    pub use repo::{CommitId, EmptyRepo, EntryKind, GitRepo, MemoryRepo, TreeChild, UpstreamRepo};

    /// Class name / destination path / upstream path translation
    pub mod translate;
    pub use translate::{Translator, UpstreamLookup};

    /// Directory-aware prefix completion
    pub mod complete;

    /// add / modify / sort / autocomplete dispatch
    pub mod editor;
    pub use editor::{CompletionRequest, LedgerEditor};
}

/// CLI command handlers
pub mod cli_ext {
    /// Ledger subcommands and completion mode
    pub mod ledger_cmd;
}

/// Infrastructure - Configuration
pub mod infra {
    /// Configuration management with TOML support and env overrides
    pub mod config;
    pub use config::{Config, load_config};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{Ledger, LedgerEditor, LedgerEntry, LedgerError, LedgerFile, PathLayout};
pub use infra::{Config, load_config};
