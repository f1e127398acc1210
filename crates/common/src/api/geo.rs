use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// POST /geocode/city request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoCityRequest {
    pub city: String,
    pub state: String,
}

/// POST /geocode/city response.
///
/// Coordinates are absent when the lookup found nothing usable;
/// `diagnostic` then says why. It is `"OK"` otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoCityResponse {
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub diagnostic: String,
    /// Whether the underlying search was served from cache.
    #[serde(default)]
    pub cached: bool,
    pub resolved_at: DateTime<Utc>,
}

/// POST /geocode/address request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoAddressRequest {
    pub address: String,
}

/// POST /geocode/reverse request. Coordinates are kept as text and parsed server-side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoReverseRequest {
    pub lat: String,
    pub lon: String,
}

/// Error body returned by the geo service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoErrorResponse {
    pub error: String,
    /// Error category ("validation", "transport", ...).
    pub kind: String,
}
