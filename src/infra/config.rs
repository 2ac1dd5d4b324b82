use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::layout::PathLayout;

/// Config file names searched in the working directory, in priority order
pub const CONFIG_FILES: [&str; 2] = ["expected-upstream.toml", ".expected-upstream.toml"];

/// Environment variable prefix (`EXPECTED_UPSTREAM_REPO`, `EXPECTED_UPSTREAM_LAYOUT__...`)
pub const ENV_PREFIX: &str = "EXPECTED_UPSTREAM";

/// Default ledger file name inside the repository
pub const LEDGER_FILE_NAME: &str = "EXPECTED_UPSTREAM";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Git checkout holding the upstream history (and, by default, the ledger)
    pub repo: Utf8PathBuf,

    /// Ledger file; `<repo>/EXPECTED_UPSTREAM` when unset
    pub ledger: Option<Utf8PathBuf>,

    /// Tags offered when completing a tag or commit argument
    pub autocomplete_tags: Vec<String>,

    /// Root prefixes of the destination and upstream trees
    pub layout: PathLayout,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            repo: Utf8PathBuf::from("."),
            ledger: None,
            autocomplete_tags: [
                "jdk7u/jdk7u40-b60",
                "jdk8u/jdk8u121-b13",
                "jdk8u/jdk8u60-b31",
                "jdk9/jdk-9+181",
                "jdk11u/jdk-11+28",
                "jdk11u/jdk-11.0.13-ga",
            ]
            .map(String::from)
            .to_vec(),
            layout: PathLayout::default(),
        }
    }
}

impl Config
{
    pub fn ledger_path(&self) -> Utf8PathBuf
    {
        self.ledger
            .clone()
            .unwrap_or_else(|| {
                self.repo
                    .join(LEDGER_FILE_NAME)
            })
    }
}

/// Load configuration from `explicit` or the first config file found, then
/// apply environment overrides.
pub fn load_config(explicit: Option<&Utf8Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            builder = builder.add_source(config::File::from(path.as_std_path()).required(true));
        }
        None =>
        {
            if let Some(path) = CONFIG_FILES
                .iter()
                .find(|p| Utf8Path::new(p).exists())
            {
                builder = builder.add_source(config::File::with_name(path));
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!("Config file already exists at {}. Use --force to overwrite.", config_path);
    }

    let config = Config::default();
    let toml_string = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("DRY RUN: would write {}:\n{}", config_path, toml_string);
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path);
    }
    Ok(())
}
