pub mod config;
pub mod users;

use clap::{Parser, Subcommand};

/// Homework Helper: metered chat gateway in front of the AI service.
#[derive(Debug, Parser)]
#[command(name = "homework-helper", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Inspect or seed user accounts directly in the state directory.
    #[command(subcommand)]
    User(UserCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create an account and print its id.
    Add {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Print an account with its usage for the current month.
    Show {
        /// User id (UUID).
        id: String,
    },
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `HH_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.  A missing file means all defaults.
///
/// [`Config`]: hh_domain::config::Config
pub fn load_config() -> anyhow::Result<(hh_domain::config::Config, String)> {
    let config_path = std::env::var("HH_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        hh_domain::config::Config::default()
    };

    Ok((config, config_path))
}
