//! Shell completion generation using clap_complete.
//!
//! Static scripts only know the subcommands and flags. The `--dynamic` bash
//! hook asks the binary itself (`--autocomplete <index> <words...>`) so tags,
//! class names and upstream paths complete too.

use anyhow::{Context, Result};
use clap::{Command, CommandFactory};
use clap_complete::{Shell as CompletionShell, generate, generate_to};
use std::{fs, io};

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};
use crate::core::editor::AUTOCOMPLETE_FLAG;

const BIN_NAME: &str = "expected-upstream";

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    if args.dynamic {
        if !matches!(args.shell, Shell::Bash) {
            anyhow::bail!("--dynamic is only available for bash");
        }
        print!("{}", dynamic_bash_hook(BIN_NAME));
        return Ok(());
    }

    let mut cmd: Command = Cli::command();
    let shell: CompletionShell = args.shell.into();

    if args.stdout {
        generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
        return Ok(());
    }

    let dir = args
        .out_dir
        .ok_or_else(|| anyhow::anyhow!("--out-dir is required unless --stdout is set"))?;

    if ctx.dry_run {
        if !ctx.quiet {
            println!("DRY RUN: would write {:?} completion to {}", args.shell, dir);
        }
        return Ok(());
    }

    fs::create_dir_all(&dir).context("create --out-dir")?;
    let path = generate_to(shell, &mut cmd, BIN_NAME, &dir).context("generate completion file")?;

    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}

/// Bash completion function delegating to `<bin> --autocomplete`.
pub fn dynamic_bash_hook(bin: &str) -> String {
    let func = format!("_{}_complete", bin.replace('-', "_"));
    format!(
        r#"{func}() {{
    local IFS=$'\n'
    COMPREPLY=($({bin} {AUTOCOMPLETE_FLAG} "$COMP_CWORD" "${{COMP_WORDS[@]:1}}" 2>/dev/null))
}}
complete -o nospace -F {func} {bin}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_hook_calls_autocomplete() {
        let hook = dynamic_bash_hook("expected-upstream");
        assert!(hook.starts_with("_expected_upstream_complete() {"));
        assert!(hook.contains("expected-upstream --autocomplete \"$COMP_CWORD\" \"${COMP_WORDS[@]:1}\""));
        assert!(hook.ends_with("complete -o nospace -F _expected_upstream_complete expected-upstream\n"));
    }
}
