use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use expected_upstream::cli::{AppContext, Cli, Commands};
use expected_upstream::cli_ext::ledger_cmd::{self, Overrides};
use expected_upstream::core::CompletionRequest;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Completion queries carry partial arguments clap would reject
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if let Some(request) = CompletionRequest::from_args(&raw) {
        init_tracing(None, true);
        let candidates = ledger_cmd::autocomplete_run(&request);
        if !candidates.is_empty() {
            println!("{}", candidates.join("\n"));
        }
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref(), cli.no_color);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match run(cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if ctx.no_color {
                eprintln!("Error: {err:#}");
            } else {
                eprintln!("{} {err:#}", "Error:".red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, ctx: &AppContext) -> Result<()> {
    let overrides = Overrides::from(&cli);
    match cli.command {
        Commands::Add(args) => ledger_cmd::add_run(args, &overrides, ctx),
        Commands::Modify(args) => ledger_cmd::modify_run(args, &overrides, ctx),
        Commands::Sort => ledger_cmd::sort_run(&overrides, ctx),
        Commands::Init(args) => expected_upstream::infra::config::init(args, ctx),
        Commands::Completions(args) => expected_upstream::completion::run(args, ctx),
    }
}

/// Logs go to stderr so completion output on stdout stays clean.
fn init_tracing(level: Option<&str>, no_color: bool) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .try_init();
}
