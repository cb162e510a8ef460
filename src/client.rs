use reqwest::{Client, ClientBuilder};
use std::env;
use std::time::Duration;

/// Create the default HTTP client for Open Cloud requests
/// with optimized settings for connection pooling and timeouts
pub fn create_http_client() -> Client {
    ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// Configuration for the Open Cloud client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// URL scheme (http or https)
    pub scheme: String,
    /// API host
    pub host: String,
    /// Log every request through `tracing`
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scheme: "https".to_string(),
            host: "apis.roblox.com".to_string(),
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with the given scheme and host
    pub fn new(scheme: String, host: String) -> Self {
        Config {
            scheme,
            host,
            debug: false,
        }
    }

    /// Read `OPENCLOUD_SCHEME`, `OPENCLOUD_HOST` and `OPENCLOUD_DEBUG`,
    /// falling back to the defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let scheme = env::var("OPENCLOUD_SCHEME").unwrap_or(defaults.scheme);
        let host = env::var("OPENCLOUD_HOST").unwrap_or(defaults.host);
        let debug = env::var("OPENCLOUD_DEBUG")
            .ok()
            .map(|s| parse_flag(&s))
            .unwrap_or(defaults.debug);

        Config { scheme, host, debug }
    }

    /// Set debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Root of the standard data store endpoints for a universe
    pub fn datastores_url(&self, universe_id: u64) -> String {
        format!(
            "{}/datastores/v1/universes/{}/standard-datastores",
            self.base_url(),
            universe_id
        )
    }

    /// Root of the messaging topic endpoints for a universe
    pub fn topics_url(&self, universe_id: u64) -> String {
        format!(
            "{}/messaging-service/v1/universes/{}/topics",
            self.base_url(),
            universe_id
        )
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
