use std::path::{Path, PathBuf};

use lmap_common::config::GeoConfig;
use lmap_common::GeoError;

use super::validation;

const DEFAULT_CONFIG_PATH: &str = "config/geo.toml";

/// Config file location: `LMAP_CONFIG`, else `config/geo.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("LMAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load, override from the environment, and validate the configuration.
///
/// A missing file yields defaults; a present but unreadable or malformed one
/// is an error. Nothing starts on validation failure.
pub fn load_config(path: &Path) -> Result<GeoConfig, ConfigError> {
    load_config_with(path, |_| {})
}

/// Like [`load_config`], with a final adjustment applied before validation
/// (command-line flags, forced client mode).
pub fn load_config_with(
    path: &Path,
    adjust: impl FnOnce(&mut GeoConfig),
) -> Result<GeoConfig, ConfigError> {
    tracing::info!(path = %path.display(), "Loading configuration");

    let mut config = if path.exists() {
        read_config_file(path)?
    } else {
        tracing::warn!(
            path = %path.display(),
            "Config file does not exist, using defaults"
        );
        GeoConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    adjust(&mut config);

    validation::validate(&config)?;

    tracing::info!(
        mode = ?config.client.mode,
        base_url = %config.client.base_url,
        min_interval_ms = config.policy.min_interval_ms,
        "Configuration loaded successfully"
    );

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<GeoConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn apply_env_overrides(config: &mut GeoConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(user_agent) = lookup("NOMINATIM_USER_AGENT") {
        config.client.user_agent = user_agent;
    }
    if let Some(base_url) = lookup("NOMINATIM_BASE_URL") {
        config.client.base_url = base_url;
    }
    if let Some(port) = lookup("GEO_PORT").and_then(|p| p.parse().ok()) {
        config.server.port = port;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for GeoError {
    fn from(e: ConfigError) -> Self {
        GeoError::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmap_common::config::ClientMode;
    use std::collections::HashMap;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lmap-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            ("NOMINATIM_USER_AGENT", "from-env/1.0"),
            ("GEO_PORT", "9090"),
        ]
        .into_iter()
        .collect();

        let mut config = GeoConfig::default();
        config.client.user_agent = "from-file/1.0".into();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.client.user_agent, "from-env/1.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.client.base_url, GeoConfig::default().client.base_url);
    }

    #[test]
    fn test_unparsable_port_override_ignored() {
        let mut config = GeoConfig::default();
        apply_env_overrides(&mut config, |k| (k == "GEO_PORT").then(|| "http".to_string()));
        assert_eq!(config.server.port, 8082);
    }

    #[test]
    fn test_load_valid_file() {
        let path = write_temp(
            "valid",
            r#"
            [client]
            mode = "factory"
            user_agent = "lmap-loader-test/0.1"
            base_url = "http://localhost:8088"

            [policy]
            min_interval_ms = 250
            "#,
        );

        let config = load_config_with(&path, |c| c.client.user_agent = "lmap-loader-test/0.1".into())
            .unwrap();
        assert_eq!(config.client.mode, Some(ClientMode::Factory));
        assert_eq!(config.policy.min_interval_ms, 250);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = write_temp("malformed", "[client\nmode = ");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_without_mode_fails_validation() {
        let path = PathBuf::from("/nonexistent/lmap/geo.toml");
        let err = load_config_with(&path, |c| c.client.user_agent = "ua/1".into()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let geo_err: GeoError = err.into();
        assert!(matches!(geo_err, GeoError::Configuration(_)));
    }

    #[test]
    fn test_adjust_runs_before_validation() {
        let path = PathBuf::from("/nonexistent/lmap/geo.toml");
        let config = load_config_with(&path, |c| {
            c.client.mode = Some(ClientMode::Pooled);
            c.client.user_agent = "lmap-batch/0.1".into();
        })
        .unwrap();
        assert_eq!(config.client.mode, Some(ClientMode::Pooled));
    }
}
