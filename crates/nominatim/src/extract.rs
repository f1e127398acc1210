use std::fmt;

use lmap_common::types::{GeoPoint, SearchResult};

/// Why a response yielded no usable coordinates.
///
/// These are honest outcomes of a search, not failures of the client.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// No response, or a response without features.
    NothingFound,
    /// The first feature is missing or has no geometry.
    NoFeatureGeometry,
    /// The coordinate list is missing, too short, or not finite.
    InvalidCoordinates(Vec<f64>),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingFound => f.write_str("nothing found"),
            Self::NoFeatureGeometry => f.write_str("no feature geometry found"),
            Self::InvalidCoordinates(raw) => write!(f, "invalid coordinates: {raw:?}"),
        }
    }
}

/// Result of [`extract_coordinates`].
#[derive(Clone, Debug, PartialEq)]
pub enum Extraction {
    Located(GeoPoint),
    Unusable(Diagnostic),
}

impl Extraction {
    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            Self::Located(point) => Some(*point),
            Self::Unusable(_) => None,
        }
    }

    /// `"OK"` when located, the diagnostic text otherwise.
    pub fn message(&self) -> String {
        match self {
            Self::Located(_) => "OK".to_string(),
            Self::Unusable(diagnostic) => diagnostic.to_string(),
        }
    }

    /// Flatten into `(latitude, longitude, message)`.
    pub fn into_parts(self) -> (Option<f64>, Option<f64>, String) {
        let message = self.message();
        match self {
            Self::Located(point) => (Some(point.latitude), Some(point.longitude), message),
            Self::Unusable(_) => (None, None, message),
        }
    }
}

/// Pull a (latitude, longitude) pair out of a search response.
///
/// Only the first feature is considered; with `limit=1` it is the provider's
/// top-ranked candidate. The wire order is `[longitude, latitude]`.
pub fn extract_coordinates(result: Option<&SearchResult>) -> Extraction {
    let Some(features) = result.and_then(|r| r.features.as_ref()) else {
        return Extraction::Unusable(Diagnostic::NothingFound);
    };
    if features.is_empty() {
        return Extraction::Unusable(Diagnostic::NothingFound);
    }

    let Some(geometry) = features.first().and_then(|f| f.geometry.as_ref()) else {
        return Extraction::Unusable(Diagnostic::NoFeatureGeometry);
    };

    let coords = geometry.coordinates.as_deref().unwrap_or_default();
    if coords.len() < 2 {
        return Extraction::Unusable(Diagnostic::InvalidCoordinates(coords.to_vec()));
    }

    match GeoPoint::new(coords[1], coords[0]) {
        Ok(point) => Extraction::Located(point),
        Err(_) => Extraction::Unusable(Diagnostic::InvalidCoordinates(coords.to_vec())),
    }
}
