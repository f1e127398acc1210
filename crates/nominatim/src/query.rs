use std::fmt;

use lmap_common::{GeoError, Result};

/// Parameters sent with every lookup: GeoJSON output, address breakdown,
/// top-ranked candidate only.
const FIXED_PARAMS: [(&str, &str); 3] = [
    ("format", "geocodejson"),
    ("addressdetails", "1"),
    ("limit", "1"),
];

/// A validated lookup against the provider.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// Free-form forward search (`search?q=`).
    Address(String),
    /// Structured forward search (`search?city=&state=`).
    CityState { city: String, state: String },
    /// Reverse lookup (`reverse?lat=&lon=`).
    Reverse { lat: f64, lon: f64 },
}

/// Normalized cache key for a [`Query`].
///
/// Inputs are trimmed, lower-cased and have inner whitespace collapsed, so
/// `" Las  Cruces"` and `"las cruces"` share an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl Query {
    pub fn address(address: &str) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeoError::Validation("address must not be empty".into()));
        }
        Ok(Self::Address(address.to_string()))
    }

    pub fn city_state(city: &str, state: &str) -> Result<Self> {
        let (city, state) = (city.trim(), state.trim());
        if city.is_empty() || state.is_empty() {
            return Err(GeoError::Validation(
                "city and state must not be empty".into(),
            ));
        }
        Ok(Self::CityState {
            city: city.to_string(),
            state: state.to_string(),
        })
    }

    /// Parse textual coordinates for a reverse lookup.
    pub fn reverse(lat: &str, lon: &str) -> Result<Self> {
        let lat = parse_coordinate("lat", lat, 90.0)?;
        let lon = parse_coordinate("lon", lon, 180.0)?;
        Ok(Self::Reverse { lat, lon })
    }

    /// Endpoint path relative to the provider's base address.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Address(_) | Self::CityState { .. } => "search",
            Self::Reverse { .. } => "reverse",
        }
    }

    /// Query string parameters, fixed ones included.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = match self {
            Self::Address(q) => vec![("q", q.clone())],
            Self::CityState { city, state } => {
                vec![("city", city.clone()), ("state", state.clone())]
            }
            Self::Reverse { lat, lon } => vec![("lat", lat.to_string()), ("lon", lon.to_string())],
        };
        params.extend(FIXED_PARAMS.iter().map(|(k, v)| (*k, v.to_string())));
        params
    }

    pub fn cache_key(&self) -> QueryKey {
        let key = match self {
            Self::Address(q) => format!("search:{}", normalize(q)),
            Self::CityState { city, state } => {
                format!("city:{}|{}", normalize(city), normalize(state))
            }
            Self::Reverse { lat, lon } => {
                format!("reverse:{},{}", without_sign_of_zero(*lat), without_sign_of_zero(*lon))
            }
        };
        QueryKey(key)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(q) => write!(f, "{q}"),
            Self::CityState { city, state } => write!(f, "{city}, {state}"),
            Self::Reverse { lat, lon } => write!(f, "{lat},{lon}"),
        }
    }
}

impl QueryKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `-0` and `0` name the same coordinate.
fn without_sign_of_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

fn parse_coordinate(name: &str, raw: &str, limit: f64) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| GeoError::Validation(format!("{name} is not a number: {raw:?}")))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(GeoError::Validation(format!(
            "{name} must be within ±{limit}, got {raw}"
        )));
    }
    Ok(without_sign_of_zero(value))
}

fn normalize(s: &str) -> String {
    collapse_whitespace(&s.to_lowercase())
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(c);
            prev_was_space = false;
        }
    }
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("las   cruces"), "las cruces");
        assert_eq!(collapse_whitespace("  las\n\t cruces  "), "las cruces");
    }

    #[test]
    fn test_city_state_params_and_key() {
        let query = Query::city_state(" Las Cruces ", "NM").unwrap();
        assert_eq!(query.endpoint(), "search");
        assert_eq!(
            query.params(),
            vec![
                ("city", "Las Cruces".to_string()),
                ("state", "NM".to_string()),
                ("format", "geocodejson".to_string()),
                ("addressdetails", "1".to_string()),
                ("limit", "1".to_string()),
            ]
        );
        assert_eq!(query.cache_key().as_str(), "city:las cruces|nm");
    }

    #[test]
    fn test_equivalent_inputs_share_a_key() {
        let a = Query::city_state("MIAMI", " fl").unwrap().cache_key();
        let b = Query::city_state("miami ", "FL").unwrap().cache_key();
        assert_eq!(a, b);

        let a = Query::address("1201 N  Bowser Rd").unwrap().cache_key();
        let b = Query::address("1201 n bowser rd").unwrap().cache_key();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let address = Query::address("miami fl").unwrap().cache_key();
        let city = Query::city_state("miami", "fl").unwrap().cache_key();
        assert_ne!(address, city);
    }

    #[test]
    fn test_reverse_parses_and_normalizes_numbers() {
        let query = Query::reverse(" 32.9630 ", "-96.71").unwrap();
        assert_eq!(query.endpoint(), "reverse");
        assert_eq!(query.params()[0], ("lat", "32.963".to_string()));
        assert_eq!(query.params()[1], ("lon", "-96.71".to_string()));
        assert_eq!(
            query.cache_key(),
            Query::reverse("32.963", "-96.710").unwrap().cache_key()
        );
    }

    #[test]
    fn test_negative_zero_shares_key_with_zero() {
        let signed = Query::reverse("-0", "-0.0").unwrap();
        let unsigned = Query::reverse("0", "0").unwrap();
        assert_eq!(signed.cache_key(), unsigned.cache_key());
        assert_eq!(signed.cache_key().as_str(), "reverse:0,0");
        assert_eq!(signed.params()[0], ("lat", "0".to_string()));

        // Built directly, bypassing the parser.
        let direct = Query::Reverse { lat: -0.0, lon: 0.0 };
        assert_eq!(direct.cache_key(), unsigned.cache_key());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(matches!(Query::address("   "), Err(GeoError::Validation(_))));
        assert!(matches!(
            Query::city_state("Miami", " "),
            Err(GeoError::Validation(_))
        ));
        assert!(matches!(
            Query::reverse("north", "10"),
            Err(GeoError::Validation(_))
        ));
        assert!(matches!(
            Query::reverse("91", "10"),
            Err(GeoError::Validation(_))
        ));
        assert!(matches!(
            Query::reverse("NaN", "10"),
            Err(GeoError::Validation(_))
        ));
    }
}
