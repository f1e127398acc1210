use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};

/// A validated (latitude, longitude) pair. Both components are finite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::Validation(format!(
                "non-finite coordinate ({latitude}, {longitude})"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// A city supplied by the caller, enriched with coordinates once geocoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl City {
    /// Create a city record. Name and state must not be blank.
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Result<Self> {
        let city = Self {
            name: name.into(),
            state: state.into(),
            latitude: None,
            longitude: None,
        };
        city.validate()?;
        Ok(city)
    }

    /// Check the required fields. Records built through serde skip `new`,
    /// so consumers call this before use.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GeoError::Validation("city name must not be empty".into()));
        }
        if self.state.trim().is_empty() {
            return Err(GeoError::Validation(format!(
                "state must not be empty for city {}",
                self.name
            )));
        }
        Ok(())
    }

    /// Copy of this city carrying the given coordinates.
    pub fn with_location(&self, point: GeoPoint) -> Self {
        Self {
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            ..self.clone()
        }
    }

    /// Coordinates, if this city has been geocoded.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => GeoPoint::new(latitude, longitude).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_requires_name_and_state() {
        assert!(City::new("Las Cruces", "NM").is_ok());
        assert!(matches!(
            City::new("  ", "NM"),
            Err(GeoError::Validation(_))
        ));
        assert!(matches!(
            City::new("Miami", ""),
            Err(GeoError::Validation(_))
        ));
    }

    #[test]
    fn test_with_location_copies_and_enriches() {
        let city = City::new("Brownsville", "TX").unwrap();
        assert!(city.location().is_none());

        let point = GeoPoint::new(25.9017, -97.4975).unwrap();
        let located = city.with_location(point);
        assert_eq!(located.name, "Brownsville");
        assert_eq!(located.latitude, Some(25.9017));
        assert_eq!(located.longitude, Some(-97.4975));
        assert_eq!(located.location(), Some(point));
        assert!(city.latitude.is_none());
    }

    #[test]
    fn test_geo_point_rejects_non_finite() {
        assert!(GeoPoint::new(f64::NAN, 1.0).is_err());
        assert!(GeoPoint::new(1.0, f64::INFINITY).is_err());
        assert_eq!(GeoPoint::new(32.96, -96.71).unwrap().to_string(), "32.96, -96.71");
    }
}
