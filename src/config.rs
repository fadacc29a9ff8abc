//! Adapter configuration.
//!
//! Options arrive as an [`AdapterOptions`] bag (every field optional, deserializable
//! from the surrounding framework's configuration) and are resolved once into an
//! immutable [`AdapterConfig`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default store host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default store port.
pub const DEFAULT_PORT: u16 = 6379;

/// Default name of the tracking set. Empty disables tracking.
pub const DEFAULT_STATS_KEY: &str = "_PHCR";

/// Default entry lifetime in seconds, used when neither the caller nor the codec
/// supplies one.
pub const DEFAULT_LIFETIME: u64 = 3600;

/// Raw adapter options, as supplied by the caller.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdapterOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub index: Option<u32>,
    pub persistent: Option<bool>,
    pub auth: Option<String>,
    pub stats_key: Option<String>,
    pub lifetime: Option<u64>,
    pub prefix: Option<String>,
}

impl AdapterOptions {
    /// Fill every absent option with its default. `auth` stays optional.
    pub fn with_defaults(self) -> Self {
        AdapterOptions {
            host: self.host.or_else(|| Some(DEFAULT_HOST.to_string())),
            port: self.port.or(Some(DEFAULT_PORT)),
            index: self.index.or(Some(0)),
            persistent: self.persistent.or(Some(false)),
            auth: self.auth,
            stats_key: self
                .stats_key
                .or_else(|| Some(DEFAULT_STATS_KEY.to_string())),
            lifetime: self.lifetime.or(Some(DEFAULT_LIFETIME)),
            prefix: self.prefix.or_else(|| Some(String::new())),
        }
    }
}

/// Resolved, immutable adapter configuration.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AdapterConfig {
    pub host: String,
    pub port: u16,
    pub logical_db_index: u32,
    pub persistent_connection: bool,
    pub auth_secret: Option<String>,
    pub stats_key: String,
    pub default_lifetime: u64,
    pub key_prefix: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            logical_db_index: 0,
            persistent_connection: false,
            auth_secret: None,
            stats_key: DEFAULT_STATS_KEY.to_string(),
            default_lifetime: DEFAULT_LIFETIME,
            key_prefix: String::new(),
        }
    }
}

impl TryFrom<AdapterOptions> for AdapterConfig {
    type Error = Error;

    fn try_from(options: AdapterOptions) -> Result<Self> {
        fn required<T>(value: Option<T>, name: &str) -> Result<T> {
            value.ok_or_else(|| {
                Error::ConfigInconsistencyError(format!("option '{}' is missing", name))
            })
        }

        Ok(AdapterConfig {
            host: required(options.host, "host")?,
            port: required(options.port, "port")?,
            logical_db_index: required(options.index, "index")?,
            persistent_connection: required(options.persistent, "persistent")?,
            auth_secret: options.auth,
            stats_key: required(options.stats_key, "statsKey")?,
            default_lifetime: required(options.lifetime, "lifetime")?,
            key_prefix: required(options.prefix, "prefix")?,
        })
    }
}

impl AdapterConfig {
    /// Resolve caller options against the defaults.
    ///
    /// # Errors
    /// Returns `Error::ConfigInconsistencyError` only if defaulting left a required
    /// option unset, which indicates a bug rather than bad input.
    pub fn from_options(options: AdapterOptions) -> Result<Self> {
        Self::try_from(options.with_defaults())
    }

    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// Reads `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`, `REDIS_PERSISTENT`, `REDIS_AUTH`,
    /// `CACHE_STATS_KEY`, `CACHE_LIFETIME` and `CACHE_PREFIX`. Values that fail to
    /// parse are ignored.
    pub fn from_env() -> Result<Self> {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok()
        }
        fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            var(name).and_then(|s| s.trim().parse::<T>().ok())
        }

        let options = AdapterOptions {
            host: var("REDIS_HOST"),
            port: parsed("REDIS_PORT"),
            index: parsed("REDIS_DB"),
            persistent: var("REDIS_PERSISTENT").map(|s| {
                matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
            }),
            auth: var("REDIS_AUTH").filter(|s| !s.is_empty()),
            stats_key: var("CACHE_STATS_KEY"),
            lifetime: parsed("CACHE_LIFETIME"),
            prefix: var("CACHE_PREFIX"),
        };

        Self::from_options(options)
    }

    /// Whether the stats set is maintained (enables `query_keys` and `flush`).
    pub fn tracking_enabled(&self) -> bool {
        !self.stats_key.is_empty()
    }

    /// `host:port` of the store endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.logical_db_index = index;
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent_connection = persistent;
        self
    }

    pub fn with_auth(mut self, secret: impl Into<String>) -> Self {
        self.auth_secret = Some(secret.into());
        self
    }

    /// Set the tracking set name. An empty string disables tracking.
    pub fn with_stats_key(mut self, stats_key: impl Into<String>) -> Self {
        self.stats_key = stats_key.into();
        self
    }

    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.default_lifetime = seconds;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}
