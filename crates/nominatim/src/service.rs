use std::sync::Arc;
use std::time::Instant;

use lmap_common::types::{City, GeoPoint, SearchResult};
use lmap_common::{GeoError, Result};
use reqwest::RequestBuilder;

use crate::client::ClientProvider;
use crate::extract::{extract_coordinates, Diagnostic, Extraction};
use crate::policy::UsagePolicy;
use crate::query::Query;
use crate::rate_limit::Permit;

/// A parsed response and whether it came from the cache.
#[derive(Clone, Debug)]
pub struct Lookup {
    pub result: SearchResult,
    pub cached: bool,
}

/// Outcome of locating a city: coordinates when usable, and the diagnostic
/// (`"OK"` on success).
#[derive(Clone, Debug, PartialEq)]
pub struct CityLocation {
    pub point: Option<GeoPoint>,
    pub diagnostic: String,
    pub cached: bool,
}

/// Outcome of geocoding one [`City`] record.
#[derive(Clone, Debug, PartialEq)]
pub enum CityOutcome {
    /// A copy of the input with coordinates filled in.
    Geocoded(City),
    /// The search succeeded but yielded nothing usable.
    Skipped { city: City, diagnostic: Diagnostic },
}

impl CityOutcome {
    pub fn into_geocoded(self) -> Option<City> {
        match self {
            Self::Geocoded(city) => Some(city),
            Self::Skipped { .. } => None,
        }
    }
}

/// Client for the Nominatim geocoding API.
///
/// Usage policy (<https://operations.osmfoundation.org/policies/nominatim/>):
/// at most one request per second, results cached, every request identified
/// by a User-Agent. The first two are enforced by the shared [`UsagePolicy`],
/// the last by the [`ClientProvider`].
pub struct NominatimService {
    provider: ClientProvider,
    policy: Arc<UsagePolicy>,
}

impl NominatimService {
    pub fn new(provider: ClientProvider, policy: Arc<UsagePolicy>) -> Self {
        Self { provider, policy }
    }

    /// Forward geocode a free-form address.
    pub async fn geocode_by_address(&self, address: &str) -> Result<SearchResult> {
        Ok(self.lookup(&Query::address(address)?).await?.result)
    }

    /// Forward geocode with structured city and state parameters.
    pub async fn geocode_by_city_state(&self, city: &str, state: &str) -> Result<SearchResult> {
        Ok(self.lookup(&Query::city_state(city, state)?).await?.result)
    }

    /// Reverse geocode textual coordinates.
    pub async fn reverse_geocode(&self, lat: &str, lon: &str) -> Result<SearchResult> {
        Ok(self.lookup(&Query::reverse(lat, lon)?).await?.result)
    }

    /// Run a query through the cache, then the rate limiter and the network.
    ///
    /// The cache is consulted again once the permit is held: callers queued
    /// behind an identical query get its stored result and return their slot.
    #[tracing::instrument(skip_all, fields(query = %query))]
    pub async fn lookup(&self, query: &Query) -> Result<Lookup> {
        let key = query.cache_key();
        if let Some(result) = self.policy.cached(&key).await {
            tracing::debug!(key = %key, "Geocoding cache hit");
            return Ok(Lookup {
                result,
                cached: true,
            });
        }

        let request = self.prepare(query.endpoint(), &query.params())?;
        let permit = self.policy.acquire().await;

        if let Some(result) = self.policy.cached_after_wait(&key).await {
            tracing::debug!(key = %key, "Resolved by an earlier caller while queued");
            drop(permit);
            return Ok(Lookup {
                result,
                cached: true,
            });
        }

        let body = self.transmit(query.endpoint(), request, permit).await?;
        let result: SearchResult = serde_json::from_str(&body).map_err(|e| {
            metrics::counter!("geocode.request.errors", "endpoint" => query.endpoint())
                .increment(1);
            GeoError::Deserialization(format!("{} response: {}", query.endpoint(), e))
        })?;

        self.policy.store(key, result.clone()).await;
        Ok(Lookup {
            result,
            cached: false,
        })
    }

    /// Raw text of the provider's status endpoint.
    pub async fn check_status(&self) -> Result<String> {
        let request = self.prepare("status", &[])?;
        let permit = self.policy.acquire().await;
        self.transmit("status", request, permit).await
    }

    /// Locate a city, reporting "nothing usable" as a diagnostic rather than an error.
    pub async fn locate_city(&self, city: &str, state: &str) -> Result<CityLocation> {
        let lookup = self.lookup(&Query::city_state(city, state)?).await?;
        let extraction = extract_coordinates(Some(&lookup.result));
        Ok(CityLocation {
            point: extraction.point(),
            diagnostic: extraction.message(),
            cached: lookup.cached,
        })
    }

    /// Geocode one city record. The input is left untouched.
    pub async fn geocode_city(&self, city: &City) -> Result<CityOutcome> {
        city.validate()?;

        let result = self.geocode_by_city_state(&city.name, &city.state).await?;
        Ok(match extract_coordinates(Some(&result)) {
            Extraction::Located(point) => CityOutcome::Geocoded(city.with_location(point)),
            Extraction::Unusable(diagnostic) => CityOutcome::Skipped {
                city: city.clone(),
                diagnostic,
            },
        })
    }

    /// Geocode a batch of cities in order, returning copies of the ones that
    /// resolved. Cities without usable coordinates are skipped; upstream
    /// failures abort the batch.
    pub async fn geocode_cities(&self, cities: &[City]) -> Result<Vec<City>> {
        let mut geocoded = Vec::with_capacity(cities.len());

        for city in cities {
            tracing::info!(city = %city, "Geocoding city");

            match self.geocode_city(city).await? {
                CityOutcome::Geocoded(located) => {
                    if let Some(point) = located.location() {
                        tracing::info!(city = %located, %point, "Geocoded city");
                    }
                    geocoded.push(located);
                }
                CityOutcome::Skipped { city, diagnostic } => {
                    tracing::warn!(city = %city, %diagnostic, "Skipping city");
                }
            }
        }

        Ok(geocoded)
    }

    /// Build a GET against `path`. The client is owned by the request; in
    /// factory mode it is released on every return path.
    fn prepare(&self, path: &str, params: &[(&'static str, String)]) -> Result<RequestBuilder> {
        let client = self.provider.get_client()?;
        let url = client.endpoint(path)?;
        Ok(client.http().get(url).query(params))
    }

    /// Spend `permit` on `request` and return the body of a 2xx response.
    async fn transmit(
        &self,
        path: &str,
        request: RequestBuilder,
        permit: Permit,
    ) -> Result<String> {
        let start = Instant::now();
        permit.mark_sent();

        tracing::debug!(path, "Sending geocoding request");
        let response = request.send().await.map_err(|e| {
            metrics::counter!("geocode.request.errors", "endpoint" => path.to_string())
                .increment(1);
            if e.is_timeout() {
                GeoError::Transport(format!("{path} request timed out"))
            } else {
                GeoError::Transport(format!("{path} request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GeoError::Transport(format!("{path} response body unreadable: {e}"))
        })?;

        metrics::histogram!("geocode.request.latency", "endpoint" => path.to_string())
            .record(start.elapsed().as_secs_f64());

        if !status.is_success() {
            metrics::counter!("geocode.request.errors", "endpoint" => path.to_string())
                .increment(1);
            tracing::warn!(path, status = status.as_u16(), "Geocoding request rejected");
            let snippet: String = body.chars().take(200).collect();
            return Err(GeoError::Transport(format!("HTTP {status}: {snippet}")));
        }

        Ok(body)
    }
}
