use serde::{Deserialize, Serialize};

/// Public Nominatim instance operated by the OpenStreetMap Foundation.
pub const PUBLIC_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/";

/// Top-level geocoding configuration, deserialized from geo.toml.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// How HTTP clients are obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    /// One pooled client shared by the whole process.
    Pooled,
    /// A fresh client per request scope, handed out by a factory.
    Factory,
}

/// HTTP client parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Lifecycle mode. Left unset, no client can be built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ClientMode>,
    /// Identification sent as the User-Agent header. Required by the usage policy.
    #[serde(default)]
    pub user_agent: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Pooled connections are recycled after this many seconds.
    #[serde(default = "default_connection_lifetime_secs")]
    pub connection_lifetime_secs: u64,
    /// Idle pooled connections are closed after this many seconds.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    PUBLIC_NOMINATIM_URL.to_string()
}

const fn default_connection_lifetime_secs() -> u64 {
    30 * 60
}

const fn default_idle_timeout_secs() -> u64 {
    10
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: None,
            user_agent: String::new(),
            base_url: default_base_url(),
            connection_lifetime_secs: default_connection_lifetime_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Client configuration with the given identification and default tuning.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_mode(mut self, mode: ClientMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Upstream usage policy: request spacing and result caching.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum spacing between two outbound requests, process-wide.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

const fn default_min_interval_ms() -> u64 {
    1000
}

const fn default_cache_ttl_seconds() -> u64 {
    24 * 3600
}

const fn default_cache_max_entries() -> usize {
    10_000
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

/// HTTP seam settings for the geo service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

const fn default_port() -> u16 {
    8082
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}
