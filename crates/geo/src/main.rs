use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;

use lmap_geo::config;
use lmap_geo::routes::{self, AppState};
use lmap_nominatim::{ClientProvider, NominatimService, UsagePolicy};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("LMap Geo starting");

    // Fail loudly on misconfiguration.
    let geo_config = match config::load_config(&config::config_path()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration, refusing to start");
            std::process::exit(1);
        }
    };

    let provider = match ClientProvider::from_config(&geo_config.client) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up geocoding client");
            std::process::exit(1);
        }
    };
    tracing::info!(mode = ?provider.mode(), "Geocoding client ready");

    // Install Prometheus metrics recorder.
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let state = Arc::new(AppState {
        geocoder: NominatimService::new(provider, UsagePolicy::shared(&geo_config.policy)),
        metrics_handle: Some(metrics_handle),
    });

    let app = routes::router(state);

    let port = geo_config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!(port = port, "LMap Geo listening");

    axum::serve(listener, app).await.expect("HTTP server error");
}
