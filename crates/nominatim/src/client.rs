use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use lmap_common::config::{ClientConfig, ClientMode};
use lmap_common::{GeoError, Result};
use reqwest::Url;

/// Ready-to-use handle on the geocoding provider: an HTTP client carrying the
/// identification header, plus the base address requests are resolved against.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone, Debug)]
pub struct NominatimHttp {
    http: reqwest::Client,
    base_url: Url,
}

impl NominatimHttp {
    /// Wrap an existing client. The caller is responsible for its User-Agent.
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Build a client from configuration.
    pub fn build(config: &ClientConfig) -> Result<Self> {
        validate_user_agent(&config.user_agent)?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GeoError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Self::new(http, &config.base_url)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path (`"search"`, `"reverse"`, `"status"`) against the base address.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GeoError::Configuration(format!("invalid endpoint {path:?}: {e}")))
    }
}

fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(GeoError::Configuration(
            "user agent must not be empty; the provider requires client identification".into(),
        ));
    }
    Ok(())
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| GeoError::Configuration(format!("invalid base URL {raw:?}: {e}")))?;
    // Without a trailing slash, join() would replace the last path segment.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

static POOLED: OnceLock<PooledClient> = OnceLock::new();

/// The process-wide pooled client.
///
/// Configured once: later [`PooledClient::init`] calls return the existing
/// instance and ignore their configuration. The inner client is rebuilt once
/// it outlives `connection_lifetime_secs`, which recycles its connections.
pub struct PooledClient {
    config: ClientConfig,
    lifetime: Duration,
    current: Mutex<PoolGeneration>,
}

struct PoolGeneration {
    handle: NominatimHttp,
    built_at: Instant,
    generation: u64,
}

impl PooledClient {
    /// Initialize the process-wide client, or return it if already initialized.
    ///
    /// An empty user agent is rejected even when an instance already exists.
    pub fn init(config: &ClientConfig) -> Result<&'static PooledClient> {
        validate_user_agent(&config.user_agent)?;

        if let Some(existing) = POOLED.get() {
            if existing.config.user_agent != config.user_agent
                || existing.config.base_url != config.base_url
            {
                tracing::debug!(
                    user_agent = %existing.config.user_agent,
                    "Pooled client already initialized, ignoring new configuration"
                );
            }
            return Ok(existing);
        }

        let pooled = Self::new(config.clone())?;
        let pooled = POOLED.get_or_init(|| pooled);
        tracing::info!(
            user_agent = %pooled.config.user_agent,
            base_url = %pooled.config.base_url,
            "Pooled geocoding client initialized"
        );
        Ok(pooled)
    }

    /// The process-wide client, if [`PooledClient::init`] has run.
    pub fn global() -> Result<&'static PooledClient> {
        POOLED.get().ok_or_else(|| {
            GeoError::NotInitialized(
                "pooled client requested before PooledClient::init was called".into(),
            )
        })
    }

    fn new(config: ClientConfig) -> Result<Self> {
        let handle = NominatimHttp::build(&config)?;
        Ok(Self {
            lifetime: Duration::from_secs(config.connection_lifetime_secs),
            config,
            current: Mutex::new(PoolGeneration {
                handle,
                built_at: Instant::now(),
                generation: 0,
            }),
        })
    }

    /// A handle on the shared pool, recycling it first if it has expired.
    pub fn client(&self) -> Result<NominatimHttp> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if current.built_at.elapsed() >= self.lifetime {
            let handle = NominatimHttp::build(&self.config)?;
            current.generation += 1;
            tracing::debug!(
                generation = current.generation,
                "Recycling pooled geocoding connections"
            );
            current.handle = handle;
            current.built_at = Instant::now();
        }

        Ok(current.handle.clone())
    }

    /// How many times the pool has been recycled.
    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Externally managed source of request-scoped clients.
pub trait ClientFactory: Send + Sync {
    fn create_client(&self) -> Result<NominatimHttp>;
}

impl<F> ClientFactory for F
where
    F: Fn() -> Result<NominatimHttp> + Send + Sync,
{
    fn create_client(&self) -> Result<NominatimHttp> {
        self()
    }
}

/// Default factory: one configured `reqwest::Client` whose handles are given
/// out per scope, all sharing its connection pool.
pub struct ReqwestClientFactory {
    template: NominatimHttp,
}

impl ReqwestClientFactory {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            template: NominatimHttp::build(config)?,
        })
    }
}

impl ClientFactory for ReqwestClientFactory {
    fn create_client(&self) -> Result<NominatimHttp> {
        Ok(self.template.clone())
    }
}

/// Supplies HTTP clients under exactly one lifecycle mode.
#[derive(Clone)]
pub enum ClientProvider {
    /// Use the process-wide [`PooledClient`].
    Pooled,
    /// Ask the factory for a new client on every call.
    Factory(Arc<dyn ClientFactory>),
}

impl ClientProvider {
    /// Initialize the process-wide pool (first configuration wins) and use it.
    pub fn pooled(config: &ClientConfig) -> Result<Self> {
        PooledClient::init(config)?;
        Ok(Self::Pooled)
    }

    pub fn factory(factory: impl ClientFactory + 'static) -> Self {
        Self::Factory(Arc::new(factory))
    }

    /// Build the provider named by `config.mode`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        match config.mode {
            Some(ClientMode::Pooled) => Self::pooled(config),
            Some(ClientMode::Factory) => Ok(Self::factory(ReqwestClientFactory::new(config)?)),
            None => Err(GeoError::Configuration(
                "no client lifecycle mode selected (client.mode = \"pooled\" | \"factory\")"
                    .into(),
            )),
        }
    }

    pub fn mode(&self) -> ClientMode {
        match self {
            Self::Pooled => ClientMode::Pooled,
            Self::Factory(_) => ClientMode::Factory,
        }
    }

    /// A client for the current scope. Factory clients are owned by the caller
    /// and released when dropped.
    pub fn get_client(&self) -> Result<NominatimHttp> {
        match self {
            Self::Pooled => PooledClient::global()?.client(),
            Self::Factory(factory) => factory.create_client(),
        }
    }
}

impl fmt::Debug for ClientProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pooled => f.write_str("ClientProvider::Pooled"),
            Self::Factory(_) => f.write_str("ClientProvider::Factory(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config() -> ClientConfig {
        ClientConfig::new("lmap-tests/0.1").with_base_url("https://nominatim.example.org")
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = NominatimHttp::build(
            &ClientConfig::new("lmap-tests/0.1").with_base_url("http://localhost:8080/nominatim"),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("search").unwrap().as_str(),
            "http://localhost:8080/nominatim/search"
        );
        assert_eq!(
            client.endpoint("reverse").unwrap().as_str(),
            "http://localhost:8080/nominatim/reverse"
        );
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let err = NominatimHttp::build(&ClientConfig::new("  ")).unwrap_err();
        assert!(matches!(err, GeoError::Configuration(_)));
        assert!(matches!(
            ReqwestClientFactory::new(&ClientConfig::new("")),
            Err(GeoError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = NominatimHttp::build(&ClientConfig::new("ua").with_base_url("not a url"))
            .unwrap_err();
        assert!(matches!(err, GeoError::Configuration(_)));
    }

    #[test]
    fn test_missing_mode_is_configuration_error() {
        let err = ClientProvider::from_config(&config()).unwrap_err();
        assert!(matches!(err, GeoError::Configuration(_)));
    }

    #[test]
    fn test_factory_mode_creates_client_per_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = {
            let calls = calls.clone();
            ClientProvider::factory(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                NominatimHttp::build(&config())
            })
        };

        assert_eq!(provider.mode(), ClientMode::Factory);
        provider.get_client().unwrap();
        provider.get_client().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_from_config() {
        let provider =
            ClientProvider::from_config(&config().with_mode(ClientMode::Factory)).unwrap();
        let client = provider.get_client().unwrap();
        assert_eq!(client.base_url().as_str(), "https://nominatim.example.org/");
    }

    #[test]
    fn test_pool_recycles_after_lifetime() {
        let mut cfg = config();
        cfg.connection_lifetime_secs = 0;
        let pooled = PooledClient::new(cfg).unwrap();

        pooled.client().unwrap();
        pooled.client().unwrap();
        assert_eq!(pooled.generation(), 2);
    }

    #[test]
    fn test_pool_reused_within_lifetime() {
        let pooled = PooledClient::new(config()).unwrap();
        pooled.client().unwrap();
        pooled.client().unwrap();
        assert_eq!(pooled.generation(), 0);
    }
}
