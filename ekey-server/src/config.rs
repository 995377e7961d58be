//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use ekey_core::{MappingError, MappingTable};

use crate::auth::SecretToken;

/// Port the ekey controller posts to unless told otherwise
pub const DEFAULT_PORT: u16 = 9123;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 9123)
    pub port: u16,
    /// Server host (default: 0.0.0.0, the controller is on the LAN)
    pub host: IpAddr,
    /// Bearer token the controller must send; unset or empty disables auth
    pub secret_token: Option<String>,
    /// Inline mapping export (takes precedence over `mapping_file`)
    pub mapping_json: Option<String>,
    /// Mapping export on disk, also reloaded on SIGHUP
    pub mapping_file: Option<PathBuf>,
    /// Request body limit in KB (default: 64)
    pub body_limit_kb: usize,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 5)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Event bus buffer per listener (default: 64)
    pub event_bus_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            secret_token: None,
            mapping_json: None,
            mapping_file: None,
            body_limit_kb: 64,
            timeout_secs: 10,
            rate_limit_enabled: false,
            rate_limit_per_sec: 5,
            rate_limit_burst: 20,
            event_bus_capacity: 64,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key-value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rate_limit_enabled = lookup("RATE_LIMIT_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.rate_limit_enabled);

        Self {
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            host: parsed(&lookup, "HOST").unwrap_or(defaults.host),
            // Tokens are compared byte for byte, so only the empty string disables auth
            secret_token: lookup("SECRET_TOKEN").filter(|v| !v.is_empty()),
            mapping_json: non_empty("MAPPING_JSON"),
            mapping_file: non_empty("MAPPING_FILE").map(PathBuf::from),
            body_limit_kb: parsed(&lookup, "BODY_LIMIT_KB").unwrap_or(defaults.body_limit_kb),
            timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: parsed(&lookup, "RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: parsed(&lookup, "RATE_LIMIT_BURST")
                .unwrap_or(defaults.rate_limit_burst),
            event_bus_capacity: parsed(&lookup, "EVENT_BUS_CAPACITY")
                .unwrap_or(defaults.event_bus_capacity),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn token(&self) -> Option<SecretToken> {
        self.secret_token.clone().and_then(SecretToken::new)
    }

    /// Build the mapping table to start with.
    ///
    /// `MAPPING_JSON` wins over `MAPPING_FILE`; with neither, ids are
    /// published raw.
    pub fn initial_mapping(&self) -> Result<MappingTable, MappingError> {
        if let Some(json) = &self.mapping_json {
            return MappingTable::from_json(json);
        }

        if let Some(path) = &self.mapping_file {
            tracing::info!(path = %path.display(), "Loading mapping file");
            return MappingTable::load(path);
        }

        Ok(MappingTable::empty())
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "Ignoring unparsable setting, using default");
            None
        }
    }
}
