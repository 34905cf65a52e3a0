//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{
    CliArgs, Command, DatabaseOverride, LoggingOverride, RefreshSocialArgs, ServeArgs,
    ServeOverrides,
};

use crate::application::embed::DEFAULT_OEMBED_URL;
use crate::application::social::DEFAULT_GRAPH_URL;
use crate::application::spotlight::SpotlightOptions;
use crate::domain::sampler::SelectionStrategy;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "popit";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_CONNECTION_LIFETIME_SECS: u64 = 10;
const DEFAULT_TABLE_PREFIX: &str = "wprdh0703_";
const DEFAULT_RECENT_PAGE_SIZE: u32 = 4;
const DEFAULT_TERM_PAGE_SIZE: u32 = 2;
const DEFAULT_AUTHOR_PAGE_SIZE: u32 = 2;
const DEFAULT_SEARCH_PAGE_SIZE: u32 = 5;
const DEFAULT_SPOTLIGHT_COUNT: u32 = 5;
const DEFAULT_SPOTLIGHT_COMPACT_COUNT: u32 = 3;
const DEFAULT_SPOTLIGHT_PAGE_SIZE: u32 = 5;
const DEFAULT_SPOTLIGHT_COMPACT_PAGE_SIZE: u32 = 2;
const DEFAULT_SPOTLIGHT_MIN_POSTS: u64 = 2;
const DEFAULT_SPOTLIGHT_CANDIDATE_LIMIT: u32 = 500;
const DEFAULT_EXCERPT_MAX_CHARS: u32 = 80;
const DEFAULT_SITE_HOST: &str = "www.popit.kr";
const DEFAULT_SOCIAL_POST_DELAY_SECS: u64 = 20;
const DEFAULT_SOCIAL_CYCLE_INTERVAL_SECS: u64 = 10 * 60 * 60;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub listing: ListingSettings,
    pub spotlight: SpotlightOptions,
    pub excerpt: ExcerptSettings,
    pub embed: EmbedSettings,
    pub social: SocialSettings,
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    pub connection_lifetime: Duration,
    pub table_prefix: String,
}

/// Default page sizes of the listing endpoints.
#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub recent_page_size: NonZeroU32,
    pub term_page_size: NonZeroU32,
    pub author_page_size: NonZeroU32,
    pub search_page_size: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct ExcerptSettings {
    pub max_chars: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct EmbedSettings {
    pub oembed_url: Url,
}

#[derive(Debug, Clone)]
pub struct SocialSettings {
    pub enabled: bool,
    pub graph_url: Url,
    pub site_host: String,
    pub post_delay: Duration,
    pub cycle_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("invalid command-line arguments: {0}")]
    Cli(#[from] clap::Error),
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("POPIT").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::RefreshSocial(args)) => raw.apply_refresh_social_overrides(args),
        None => raw.apply_serve_overrides(&ServeArgs::from_env()?.overrides),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    listing: RawListingSettings,
    spotlight: RawSpotlightSettings,
    excerpt: RawExcerptSettings,
    embed: RawEmbedSettings,
    social: RawSocialSettings,
    remote: RawRemoteSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_database_override(&overrides.database);
        self.apply_logging_override(&overrides.logging);

        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(strategy) = overrides.spotlight_strategy.as_ref() {
            self.spotlight.strategy = Some(strategy.clone());
        }
        if let Some(seed) = overrides.spotlight_seed {
            self.spotlight.seed = Some(seed);
        }
        if let Some(enabled) = overrides.social_enabled {
            self.social.enabled = Some(enabled);
        }
    }

    fn apply_refresh_social_overrides(&mut self, args: &RefreshSocialArgs) {
        self.apply_database_override(&args.database);
        self.apply_logging_override(&args.logging);

        if let Some(host) = args.site_host.as_ref() {
            self.social.site_host = Some(host.clone());
        }
        if let Some(seconds) = args.post_delay_seconds {
            self.social.post_delay_seconds = Some(seconds);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }

    fn apply_logging_override(&mut self, overrides: &LoggingOverride) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            listing,
            spotlight,
            excerpt,
            embed,
            social,
            remote,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            listing: build_listing_settings(listing)?,
            spotlight: build_spotlight_settings(spotlight)?,
            excerpt: build_excerpt_settings(excerpt)?,
            embed: build_embed_settings(embed)?,
            social: build_social_settings(social)?,
            remote: build_remote_settings(remote)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    let lifetime_secs = database
        .connection_lifetime_seconds
        .unwrap_or(DEFAULT_DB_CONNECTION_LIFETIME_SECS);
    if lifetime_secs == 0 {
        return Err(LoadError::invalid(
            "database.connection_lifetime_seconds",
            "must be greater than zero",
        ));
    }

    let table_prefix = database
        .table_prefix
        .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
    if !table_prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(LoadError::invalid(
            "database.table_prefix",
            "only ASCII letters, digits and `_` are allowed",
        ));
    }

    Ok(DatabaseSettings {
        url,
        max_connections,
        connection_lifetime: Duration::from_secs(lifetime_secs),
        table_prefix,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    Ok(ListingSettings {
        recent_page_size: page_size(
            listing.recent_page_size.unwrap_or(DEFAULT_RECENT_PAGE_SIZE),
            "listing.recent_page_size",
        )?,
        term_page_size: page_size(
            listing.term_page_size.unwrap_or(DEFAULT_TERM_PAGE_SIZE),
            "listing.term_page_size",
        )?,
        author_page_size: page_size(
            listing.author_page_size.unwrap_or(DEFAULT_AUTHOR_PAGE_SIZE),
            "listing.author_page_size",
        )?,
        search_page_size: page_size(
            listing.search_page_size.unwrap_or(DEFAULT_SEARCH_PAGE_SIZE),
            "listing.search_page_size",
        )?,
    })
}

fn build_spotlight_settings(
    spotlight: RawSpotlightSettings,
) -> Result<SpotlightOptions, LoadError> {
    let count = spotlight.count.unwrap_or(DEFAULT_SPOTLIGHT_COUNT);
    let compact_count = spotlight
        .compact_count
        .unwrap_or(DEFAULT_SPOTLIGHT_COMPACT_COUNT);
    let full_page_size = page_size(
        spotlight.page_size.unwrap_or(DEFAULT_SPOTLIGHT_PAGE_SIZE),
        "spotlight.page_size",
    )?;
    let compact_page_size = page_size(
        spotlight
            .compact_page_size
            .unwrap_or(DEFAULT_SPOTLIGHT_COMPACT_PAGE_SIZE),
        "spotlight.compact_page_size",
    )?;
    let candidate_limit = non_zero_u32(
        spotlight
            .candidate_limit
            .unwrap_or(DEFAULT_SPOTLIGHT_CANDIDATE_LIMIT)
            .into(),
        "spotlight.candidate_limit",
    )?;

    let strategy = match spotlight.strategy {
        Some(value) => SelectionStrategy::from_str(&value)
            .map_err(|reason| LoadError::invalid("spotlight.strategy", reason))?,
        None => SelectionStrategy::default(),
    };

    Ok(SpotlightOptions {
        count: count as usize,
        compact_count: compact_count as usize,
        page_size: full_page_size.get(),
        compact_page_size: compact_page_size.get(),
        min_posts: spotlight.min_posts.unwrap_or(DEFAULT_SPOTLIGHT_MIN_POSTS),
        candidate_limit: candidate_limit.get(),
        strategy,
        seed: spotlight.seed,
    })
}

fn build_excerpt_settings(excerpt: RawExcerptSettings) -> Result<ExcerptSettings, LoadError> {
    let max_chars = non_zero_u32(
        excerpt.max_chars.unwrap_or(DEFAULT_EXCERPT_MAX_CHARS).into(),
        "excerpt.max_chars",
    )?;
    Ok(ExcerptSettings { max_chars })
}

fn build_embed_settings(embed: RawEmbedSettings) -> Result<EmbedSettings, LoadError> {
    let oembed_url = parse_url(
        embed.oembed_url.as_deref().unwrap_or(DEFAULT_OEMBED_URL),
        "embed.oembed_url",
    )?;
    Ok(EmbedSettings { oembed_url })
}

fn build_social_settings(social: RawSocialSettings) -> Result<SocialSettings, LoadError> {
    let graph_url = parse_url(
        social.graph_url.as_deref().unwrap_or(DEFAULT_GRAPH_URL),
        "social.graph_url",
    )?;

    let site_host = social
        .site_host
        .unwrap_or_else(|| DEFAULT_SITE_HOST.to_string());
    let site_host = site_host.trim().trim_end_matches('/').to_string();
    if site_host.is_empty() || site_host.contains("://") {
        return Err(LoadError::invalid(
            "social.site_host",
            "expected a bare host name such as www.example.com",
        ));
    }

    let cycle_secs = social
        .cycle_interval_seconds
        .unwrap_or(DEFAULT_SOCIAL_CYCLE_INTERVAL_SECS);
    if cycle_secs == 0 {
        return Err(LoadError::invalid(
            "social.cycle_interval_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SocialSettings {
        enabled: social.enabled.unwrap_or(false),
        graph_url,
        site_host,
        post_delay: Duration::from_secs(
            social
                .post_delay_seconds
                .unwrap_or(DEFAULT_SOCIAL_POST_DELAY_SECS),
        ),
        cycle_interval: Duration::from_secs(cycle_secs),
    })
}

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let timeout_secs = remote.timeout_seconds.unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "remote.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let user_agent = remote.user_agent.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    Ok(RemoteSettings {
        timeout: Duration::from_secs(timeout_secs),
        user_agent,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    connection_lifetime_seconds: Option<u64>,
    table_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    recent_page_size: Option<u32>,
    term_page_size: Option<u32>,
    author_page_size: Option<u32>,
    search_page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSpotlightSettings {
    count: Option<u32>,
    compact_count: Option<u32>,
    page_size: Option<u32>,
    compact_page_size: Option<u32>,
    min_posts: Option<u64>,
    candidate_limit: Option<u32>,
    strategy: Option<String>,
    seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExcerptSettings {
    max_chars: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEmbedSettings {
    oembed_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSocialSettings {
    enabled: Option<bool>,
    graph_url: Option<String>,
    site_host: Option<String>,
    post_delay_seconds: Option<u64>,
    cycle_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn page_size(value: u32, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let size = non_zero_u32(value.into(), key)?;
    if size.get() > crate::application::pagination::MAX_PAGE_SIZE {
        return Err(LoadError::invalid(
            key,
            format!(
                "must not exceed {}",
                crate::application::pagination::MAX_PAGE_SIZE
            ),
        ));
    }
    Ok(size)
}
