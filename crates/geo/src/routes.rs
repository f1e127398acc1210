use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;

use lmap_common::api::geo::{
    GeoAddressRequest, GeoCityRequest, GeoCityResponse, GeoErrorResponse, GeoReverseRequest,
};
use lmap_common::types::SearchResult;
use lmap_common::GeoError;
use lmap_nominatim::NominatimService;

/// Shared application state.
pub struct AppState {
    pub geocoder: NominatimService,
    /// Absent when no recorder is installed (tests).
    pub metrics_handle: Option<PrometheusHandle>,
}

type ApiError = (StatusCode, Json<GeoErrorResponse>);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .route("/geocode/city", post(city_handler))
        .route("/geocode/address", post(address_handler))
        .route("/geocode/reverse", post(reverse_handler))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "healthy" })),
    )
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// GET /status: upstream status text, passed through.
async fn status_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state.geocoder.check_status().await.map_err(api_error)
}

/// POST /geocode/city: coordinates for a city, or a diagnostic saying why not.
async fn city_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeoCityRequest>,
) -> Result<Json<GeoCityResponse>, ApiError> {
    let location = state
        .geocoder
        .locate_city(&request.city, &request.state)
        .await
        .map_err(api_error)?;

    Ok(Json(GeoCityResponse {
        city: request.city,
        state: request.state,
        latitude: location.point.map(|p| p.latitude),
        longitude: location.point.map(|p| p.longitude),
        diagnostic: location.diagnostic,
        cached: location.cached,
        resolved_at: Utc::now(),
    }))
}

/// POST /geocode/address: the parsed search response.
async fn address_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeoAddressRequest>,
) -> Result<Json<SearchResult>, ApiError> {
    state
        .geocoder
        .geocode_by_address(&request.address)
        .await
        .map(Json)
        .map_err(api_error)
}

/// POST /geocode/reverse: the parsed reverse response.
async fn reverse_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeoReverseRequest>,
) -> Result<Json<SearchResult>, ApiError> {
    state
        .geocoder
        .reverse_geocode(&request.lat, &request.lon)
        .await
        .map(Json)
        .map_err(api_error)
}

fn api_error(e: GeoError) -> ApiError {
    let (status, kind) = match &e {
        GeoError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
        GeoError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport"),
        GeoError::Deserialization(_) => (StatusCode::BAD_GATEWAY, "deserialization"),
        GeoError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration"),
        GeoError::NotInitialized(_) => (StatusCode::INTERNAL_SERVER_ERROR, "not_initialized"),
    };

    if e.is_upstream() {
        tracing::warn!(error = %e, "Upstream geocoding failure");
    } else if status.is_server_error() {
        tracing::error!(error = %e, "Geocoding service misconfigured");
    }

    (
        status,
        Json(GeoErrorResponse {
            error: e.to_string(),
            kind: kind.to_string(),
        }),
    )
}
