use lmap_common::config::{GeoConfig, PUBLIC_NOMINATIM_URL};
use reqwest::Url;

use super::loader::ConfigError;

/// The usage policy of the public instance allows one request per second.
const PUBLIC_MIN_INTERVAL_MS: u64 = 1000;

/// Validate the complete geocoding configuration.
///
/// Collects every problem before failing. The policy section cannot be
/// relaxed below what the public Nominatim instance permits.
pub fn validate(config: &GeoConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_client(config, &mut errors);
    validate_policy(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_client(config: &GeoConfig, errors: &mut Vec<String>) {
    let c = &config.client;

    if c.mode.is_none() {
        errors.push("client.mode must be set to \"pooled\" or \"factory\"".into());
    }
    if c.user_agent.trim().is_empty() {
        errors.push("client.user_agent must not be empty".into());
    }
    if let Err(e) = Url::parse(&c.base_url) {
        errors.push(format!("client.base_url is not a valid URL: {}", e));
    }
    if c.connection_lifetime_secs == 0 {
        errors.push("client.connection_lifetime_secs must be > 0".into());
    }
    if c.idle_timeout_secs == 0 {
        errors.push("client.idle_timeout_secs must be > 0".into());
    }
    if c.request_timeout_secs == 0 {
        errors.push("client.request_timeout_secs must be > 0".into());
    }
}

fn validate_policy(config: &GeoConfig, errors: &mut Vec<String>) {
    let p = &config.policy;

    if p.cache_ttl_seconds == 0 {
        errors.push("policy.cache_ttl_seconds must be > 0 (results must be cached)".into());
    }
    if p.cache_max_entries == 0 {
        errors.push("policy.cache_max_entries must be > 0".into());
    }
    if p.min_interval_ms == 0 {
        errors.push("policy.min_interval_ms must be > 0".into());
    }
    if targets_public_instance(&config.client.base_url) && p.min_interval_ms < PUBLIC_MIN_INTERVAL_MS
    {
        errors.push(format!(
            "policy.min_interval_ms must be >= {} for {}",
            PUBLIC_MIN_INTERVAL_MS, PUBLIC_NOMINATIM_URL
        ));
    }
}

fn targets_public_instance(base_url: &str) -> bool {
    let public_host = Url::parse(PUBLIC_NOMINATIM_URL)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    Url::parse(base_url)
        .ok()
        // A trailing dot is the same host in absolute form.
        .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase()))
        .is_some_and(|host| Some(host) == public_host)
}
