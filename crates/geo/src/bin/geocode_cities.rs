use std::path::PathBuf;

use clap::Parser;

use lmap_common::config::ClientMode;
use lmap_geo::{batch, config};
use lmap_nominatim::{ClientProvider, NominatimService, UsagePolicy};

/// Geocode a list of cities through Nominatim, one request per second.
#[derive(Debug, Parser)]
#[command(name = "geocode-cities", version)]
struct Args {
    /// City as "NAME,STATE". Repeatable.
    #[arg(long = "city", value_name = "NAME,STATE")]
    cities: Vec<String>,

    /// TOML or JSON file holding a `cities` list of {name, state}.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Identification sent to Nominatim as the User-Agent header.
    #[arg(long, env = "NOMINATIM_USER_AGENT")]
    user_agent: Option<String>,

    /// Configuration file.
    #[arg(long, env = "LMAP_CONFIG", default_value = "config/geo.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    // Batch runs own the process: always the pooled client.
    let geo_config = match config::load_config_with(&args.config, |c| {
        c.client.mode = Some(ClientMode::Pooled);
        if let Some(user_agent) = &args.user_agent {
            c.client.user_agent = user_agent.clone();
        }
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let mut cities = Vec::new();
    if let Some(path) = &args.file {
        match batch::load_cities(path) {
            Ok(loaded) => cities.extend(loaded),
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to load cities");
                std::process::exit(1);
            }
        }
    }
    for raw in &args.cities {
        match batch::parse_city_arg(raw) {
            Ok(city) => cities.push(city),
            Err(e) => {
                tracing::error!(error = %e, "Invalid --city argument");
                std::process::exit(2);
            }
        }
    }
    if cities.is_empty() {
        cities = batch::sample_cities();
    }

    let provider = match ClientProvider::pooled(&geo_config.client) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up geocoding client");
            std::process::exit(1);
        }
    };
    let service = NominatimService::new(provider, UsagePolicy::shared(&geo_config.policy));

    match service.geocode_cities(&cities).await {
        Ok(geocoded) => {
            println!("Geocoded Locations:");
            for city in &geocoded {
                println!("{}", batch::format_city(city));
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Batch aborted");
            std::process::exit(1);
        }
    }
}
