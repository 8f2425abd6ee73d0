//! Server configuration from environment variables.
//!
//! Environment variables:
//!   DATABASE_URL             - PostgreSQL URL (default: postgres://localhost/mediaserver)
//!   HOST / PORT              - listen address (default: 0.0.0.0:5000)
//!   DB_MAX_CONNECTIONS       - pool size (default: 10)
//!   DB_MIN_CONNECTIONS       - connections kept open when idle (default: 1)
//!   DB_CONNECT_TIMEOUT_SECS  - how long a search waits for a connection (default: 30)
//!   DB_IDLE_TIMEOUT_SECS     - close connections idle this long (default: 600)
//!   DB_MAX_LIFETIME_SECS     - recycle connections this old, 0 = never (default: 1800)
//!   LOG_FORMAT               - "json" or "text" (default: "text")
//!   LOG_FILE                 - path to log file (optional, enables file logging)
//!   LOG_ANSI                 - "true"/"false" override ANSI colors
//!   SEARCH_MIN_SIMILARITY    - drop ranked movies scoring below this (optional)
//!   SEARCH_METADATA_MATCH    - "any" or "all" (default: "any")
//!   SEARCH_MAX_LIMIT         - largest accepted `limit` (default: 500)

use std::str::FromStr;
use std::time::Duration;

use mediacat_core::defaults;
use mediacat_core::{Error, MetadataMatch, Result, SearchConfig};
use mediacat_db::PoolConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::Config(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub file: Option<String>,
    /// `None` leaves ANSI detection to the subscriber.
    pub ansi: Option<bool>,
}

/// Everything the binary needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_connect_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,
    /// 0 disables recycling.
    pub db_max_lifetime_secs: u64,
    pub log: LogConfig,
    pub search: SearchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            db_max_connections: defaults::DB_MAX_CONNECTIONS,
            db_min_connections: defaults::DB_MIN_CONNECTIONS,
            db_connect_timeout_secs: defaults::DB_CONNECT_TIMEOUT_SECS,
            db_idle_timeout_secs: defaults::DB_IDLE_TIMEOUT_SECS,
            db_max_lifetime_secs: defaults::DB_MAX_LIFETIME_SECS,
            log: LogConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", name, value))),
    }
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup` (variable name → value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();

        let min_similarity = match lookup("SEARCH_MIN_SIMILARITY") {
            Some(raw) if !raw.trim().is_empty() => {
                Some(parse_var("SEARCH_MIN_SIMILARITY", Some(raw), 0.0_f64)?)
            }
            _ => None,
        };
        let metadata_match: MetadataMatch =
            parse_var("SEARCH_METADATA_MATCH", lookup("SEARCH_METADATA_MATCH"), MetadataMatch::Any)?;
        let max_limit = parse_var(
            "SEARCH_MAX_LIMIT",
            lookup("SEARCH_MAX_LIMIT"),
            base.search.max_limit,
        )?;

        let search = SearchConfig::new()
            .min_similarity(min_similarity)
            .metadata_match(metadata_match)
            .max_limit(max_limit);
        search.validate()?;

        let log = LogConfig {
            format: parse_var("LOG_FORMAT", lookup("LOG_FORMAT"), LogFormat::Text)?,
            file: lookup("LOG_FILE").filter(|f| !f.trim().is_empty()),
            ansi: lookup("LOG_ANSI").map(|v| parse_flag(&v)),
        };

        let config = Self {
            database_url: lookup("DATABASE_URL").unwrap_or(base.database_url),
            host: lookup("HOST").unwrap_or(base.host),
            port: parse_var("PORT", lookup("PORT"), base.port)?,
            db_max_connections: parse_var(
                "DB_MAX_CONNECTIONS",
                lookup("DB_MAX_CONNECTIONS"),
                base.db_max_connections,
            )?,
            db_min_connections: parse_var(
                "DB_MIN_CONNECTIONS",
                lookup("DB_MIN_CONNECTIONS"),
                base.db_min_connections,
            )?,
            db_connect_timeout_secs: parse_var(
                "DB_CONNECT_TIMEOUT_SECS",
                lookup("DB_CONNECT_TIMEOUT_SECS"),
                base.db_connect_timeout_secs,
            )?,
            db_idle_timeout_secs: parse_var(
                "DB_IDLE_TIMEOUT_SECS",
                lookup("DB_IDLE_TIMEOUT_SECS"),
                base.db_idle_timeout_secs,
            )?,
            db_max_lifetime_secs: parse_var(
                "DB_MAX_LIFETIME_SECS",
                lookup("DB_MAX_LIFETIME_SECS"),
                base.db_max_lifetime_secs,
            )?,
            log,
            search,
        };

        config.pool_config().validate()?;
        Ok(config)
    }

    pub fn pool_config(&self) -> PoolConfig {
        let max_lifetime = match self.db_max_lifetime_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        PoolConfig::new()
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .acquire_timeout(Duration::from_secs(self.db_connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.db_idle_timeout_secs))
            .max_lifetime(max_lifetime)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
