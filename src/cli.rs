use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "expected-upstream")]
#[command(about = "A command line tool modifying the EXPECTED_UPSTREAM file")]
#[command(
    long_about = "A command line tool modifying the EXPECTED_UPSTREAM file.\n\n\
                  Shell completion queries use `expected-upstream --autocomplete <INDEX> [WORDS...]`; \
                  see `expected-upstream completions bash --dynamic`."
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Validate and report without writing the ledger
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Config file (default: ./expected-upstream.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Upstream git repository (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    pub repo: Option<Utf8PathBuf>,

    /// Ledger file (default: <repo>/EXPECTED_UPSTREAM)
    #[arg(long, global = true, value_name = "FILE")]
    pub ledger: Option<Utf8PathBuf>,

    /// Log filter, e.g. `debug` or `expected_upstream=trace` (default: RUST_LOG or warn)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new entry into the EXPECTED_UPSTREAM file
    Add(AddArgs),

    /// Modify an entry in the EXPECTED_UPSTREAM file
    Modify(ModifyArgs),

    /// Sort the entries in the EXPECTED_UPSTREAM file
    Sort,

    /// Initialize an expected-upstream.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// A git tag or commit in the upstream-openjdkXXX branch
    pub tag_or_commit: String,

    /// Fully qualified class name or upstream source path
    pub class_or_source_file: String,

    /// Destination path in ojluni/ (guessed from the source path if omitted)
    pub ojluni_path: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ModifyArgs {
    /// Class name or file path in ojluni/
    pub class_or_ojluni_path: String,

    /// A git tag or commit in the upstream-openjdkXXX branch
    pub tag_or_commit: String,

    /// An upstream source path (kept or guessed if omitted)
    pub source_file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: Utf8PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<Utf8PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Print a bash hook that completes tags, classes and paths through
    /// `--autocomplete` (bash only, always to stdout)
    #[arg(long)]
    pub dynamic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_with_optional_destination() {
        let cli = Cli::parse_from([
            "expected-upstream",
            "add",
            "jdk11u/jdk-11+28",
            "java.util.List",
        ]);
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.tag_or_commit, "jdk11u/jdk-11+28");
                assert_eq!(args.class_or_source_file, "java.util.List");
                assert!(args.ojluni_path.is_none());
            }
            _ => panic!("expected Add command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "expected-upstream",
            "modify",
            "java.util.List",
            "jdk11u/jdk-11+28",
            "--dry-run",
            "--repo",
            "/upstream",
        ]);
        assert!(cli.dry_run);
        assert_eq!(cli.repo.as_deref().map(|p| p.as_str()), Some("/upstream"));
        assert!(matches!(cli.command, Commands::Modify(ModifyArgs { source_file: None, .. })));
    }

    #[test]
    fn modify_requires_tag() {
        assert!(Cli::try_parse_from(["expected-upstream", "modify", "java.util.List"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
