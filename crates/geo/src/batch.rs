//! Batch geocoding of city lists, as driven by the `geocode-cities` binary.

use std::path::Path;

use serde::Deserialize;

use lmap_common::types::City;
use lmap_common::{GeoError, Result};

/// Cities geocoded when none are given on the command line.
pub const SAMPLE_CITIES: [(&str, &str); 3] = [
    ("Las Cruces", "NM"),
    ("Brownsville", "TX"),
    ("Miami", "FL"),
];

#[derive(Deserialize)]
struct CityList {
    cities: Vec<City>,
}

/// Parse `"Name,ST"`. The last comma separates the state, so names may contain commas.
pub fn parse_city_arg(raw: &str) -> Result<City> {
    let (name, state) = raw.rsplit_once(',').ok_or_else(|| {
        GeoError::Validation(format!("expected \"NAME,STATE\", got {raw:?}"))
    })?;
    City::new(name.trim(), state.trim())
}

/// Read a `cities = [...]` list from a `.json` or `.toml` file.
pub fn load_cities(path: &Path) -> Result<Vec<City>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GeoError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;

    let list: CityList = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content).map_err(|e| {
            GeoError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })?
    };

    for city in &list.cities {
        city.validate()?;
    }
    Ok(list.cities)
}

pub fn sample_cities() -> Vec<City> {
    SAMPLE_CITIES
        .iter()
        .filter_map(|(name, state)| City::new(*name, *state).ok())
        .collect()
}

/// One output line: `Name, ST: lat, lon`.
pub fn format_city(city: &City) -> String {
    match city.location() {
        Some(point) => format!("{}: {}", city, point),
        None => format!("{}: not geocoded", city),
    }
}
