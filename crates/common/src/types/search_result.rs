use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top level of a Nominatim `format=geocodejson` response.
///
/// Every field is optional: the shape is controlled by the provider and
/// nothing here may be assumed present.
///
/// ```json
/// { "type": "FeatureCollection", "geocoding": {}, "features": [] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Response-level metadata (version, attribution, licence, query).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding: Option<Geocoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Feature>>,
    /// Set by the provider instead of `features` when a lookup fails
    /// (e.g. `"Unable to geocode"` for reverse queries over the ocean).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    /// The first (top-ranked) feature, if any.
    pub fn first_feature(&self) -> Option<&Feature> {
        self.features.as_ref().and_then(|f| f.first())
    }

    /// The single authoritative place metadata block for this response.
    ///
    /// GeoJSON-shaped responses carry it under the first feature's
    /// `properties.geocoding`; legacy responses only at the root.
    pub fn place_metadata(&self) -> Option<&Geocoding> {
        self.first_feature()
            .and_then(|f| f.properties.as_ref())
            .and_then(|p| p.geocoding.as_ref())
            .or(self.geocoding.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.features.as_ref().map_or(true, Vec::is_empty)
    }
}

/// One candidate location.
///
/// ```json
/// { "type": "Feature", "properties": {}, "geometry": {} }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding: Option<Geocoding>,
}

/// GeoJSON geometry. For `Point`, `coordinates` is `[longitude, latitude]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<f64>>,
}

/// Descriptive metadata. Two shapes share this record: the response-level
/// block (version, attribution, licence, query) and the per-feature block
/// (OSM identifiers and address components). Nothing is validated beyond type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geocoding {
    // Response-level block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default, alias = "license", skip_serializing_if = "Option::is_none")]
    pub licence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    // Per-feature block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_value: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Administrative hierarchy keyed by level (`"level4"` → `"Texas"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<HashMap<String, String>>,
}
