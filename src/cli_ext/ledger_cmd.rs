//! CLI command handlers for the ledger subcommands and completion mode.
//!
//! Builds the editor from config + global flags, runs one command, and prints
//! the outcome. Typed ledger errors pass through `anyhow` unchanged so `main`
//! can report them as-is.

use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use crate::cli::{AddArgs, AppContext, Cli, ModifyArgs};
use crate::core::editor::{CompletionRequest, LedgerEditor};
use crate::core::ledger::{LedgerEntry, LedgerFile};
use crate::core::repo::{EmptyRepo, GitRepo, UpstreamRepo};
use crate::infra::config::{Config, load_config};

/// Global flags that shape where the ledger and repository live
#[derive(Debug, Clone, Default)]
pub struct Overrides
{
    pub config: Option<camino::Utf8PathBuf>,
    pub repo: Option<camino::Utf8PathBuf>,
    pub ledger: Option<camino::Utf8PathBuf>,
}

impl From<&Cli> for Overrides
{
    fn from(cli: &Cli) -> Self
    {
        Self { config: cli.config.clone(), repo: cli.repo.clone(), ledger: cli.ledger.clone() }
    }
}

impl From<&CompletionRequest> for Overrides
{
    fn from(request: &CompletionRequest) -> Self
    {
        Self { config: request.config.clone(), repo: request.repo.clone(), ledger: request.ledger.clone() }
    }
}

/// Load config and apply command-line overrides.
pub fn resolve_config(overrides: &Overrides) -> Result<Config>
{
    let mut config = load_config(overrides.config.as_deref())?;
    if let Some(repo) = &overrides.repo
    {
        config.repo = repo.clone();
    }
    if let Some(ledger) = &overrides.ledger
    {
        config.ledger = Some(ledger.clone());
    }
    Ok(config)
}

fn editor<'a>(
    config: &'a Config,
    repo: &'a dyn UpstreamRepo,
    ctx: &AppContext,
) -> LedgerEditor<'a>
{
    LedgerEditor::new(repo, &config.layout, LedgerFile::new(config.ledger_path()))
        .with_tags(&config.autocomplete_tags)
        .with_dry_run(ctx.dry_run)
}

fn report(
    verb: &str,
    entry: &LedgerEntry,
    ctx: &AppContext,
)
{
    if ctx.quiet
    {
        return;
    }

    let prefix = if ctx.dry_run { "DRY RUN: would have " } else { "" };
    if ctx.no_color
    {
        println!("{prefix}{verb} the entry {entry}");
    }
    else
    {
        println!("{prefix}{} the entry {}", verb.green(), entry.bold());
    }
}

#[instrument(skip_all)]
pub fn add_run(
    args: AddArgs,
    overrides: &Overrides,
    ctx: &AppContext,
) -> Result<()>
{
    let config = resolve_config(overrides)?;
    let repo = GitRepo::open(&config.repo)?;
    let entry = editor(&config, &repo, ctx).add(
        &args.tag_or_commit,
        &args.class_or_source_file,
        args.ojluni_path
            .as_deref(),
    )?;
    report("Added", &entry, ctx);
    Ok(())
}

#[instrument(skip_all)]
pub fn modify_run(
    args: ModifyArgs,
    overrides: &Overrides,
    ctx: &AppContext,
) -> Result<()>
{
    let config = resolve_config(overrides)?;
    let repo = GitRepo::open(&config.repo)?;
    let entry = editor(&config, &repo, ctx).modify(
        &args.class_or_ojluni_path,
        &args.tag_or_commit,
        args.source_file
            .as_deref(),
    )?;
    report("Modified", &entry, ctx);
    Ok(())
}

/// `sort` never consults the upstream repository.
#[instrument(skip_all)]
pub fn sort_run(
    overrides: &Overrides,
    ctx: &AppContext,
) -> Result<()>
{
    let config = resolve_config(overrides)?;
    let count = editor(&config, &EmptyRepo, ctx).sort()?;

    if !ctx.quiet
    {
        let prefix = if ctx.dry_run { "DRY RUN: would have sorted" } else { "Sorted" };
        println!("{prefix} {count} entries in {}", config.ledger_path());
    }
    Ok(())
}

/// Answer a completion query on stdout. Never fails: a missing config,
/// repository or ledger just yields fewer suggestions.
#[instrument(skip_all, fields(index = request.index))]
pub fn autocomplete_run(request: &CompletionRequest) -> Vec<String>
{
    let config = match resolve_config(&Overrides::from(request))
    {
        Ok(config) => config,
        Err(err) =>
        {
            debug!(%err, "completion with default config");
            Config::default()
        }
    };

    let ctx = AppContext { quiet: true, no_color: true, dry_run: true };
    match GitRepo::open(&config.repo)
    {
        Ok(repo) => editor(&config, &repo, &ctx).autocomplete(request),
        Err(err) =>
        {
            debug!(%err, "completion without upstream repository");
            editor(&config, &EmptyRepo, &ctx).autocomplete(request)
        }
    }
}
