use std::path::PathBuf;

use clap::{Args, FromArgMatches, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the popit binary.
#[derive(Debug, Parser)]
#[command(name = "popit", version, about = "popit content API server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "POPIT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the content API.
    Serve(Box<ServeArgs>),
    /// Refresh the stored Facebook share counts once and exit.
    #[command(name = "refresh-social")]
    RefreshSocial(RefreshSocialArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", env = "DB_CONN", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverride {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

impl ServeArgs {
    /// Serve arguments for a launch without a subcommand. Environment-backed flags such as
    /// `DB_CONN` are still read.
    pub fn from_env() -> Result<Self, clap::Error> {
        let command = Self::augment_args(clap::Command::new("popit"));
        let matches = command.try_get_matches_from(["popit"])?;
        Self::from_arg_matches(&matches)
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub logging: LoggingOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the spotlight selection strategy (rejection|partial_shuffle).
    #[arg(long = "spotlight-strategy", value_name = "STRATEGY")]
    pub spotlight_strategy: Option<String>,

    /// Seed the spotlight generator for reproducible picks.
    #[arg(long = "spotlight-seed", value_name = "SEED")]
    pub spotlight_seed: Option<u64>,

    /// Toggle the background share-count refresher.
    #[arg(
        long = "social-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub social_enabled: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RefreshSocialArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub logging: LoggingOverride,

    /// Override the site host used to build permalinks.
    #[arg(long = "site-host", value_name = "HOST")]
    pub site_host: Option<String>,

    /// Override the pause between posts.
    #[arg(long = "post-delay-seconds", value_name = "SECONDS")]
    pub post_delay_seconds: Option<u64>,
}
