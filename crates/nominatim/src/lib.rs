//! Policy-constrained client for the Nominatim geocoding API.
//!
//! [`NominatimService`] issues forward and reverse lookups through a
//! [`ClientProvider`] (process-wide pooled client, or request-scoped clients
//! from a factory). Every outbound request passes through the shared
//! [`UsagePolicy`]: a one-request-per-second gate and a TTL result cache.
//! [`extract_coordinates`] turns a parsed response into a (latitude,
//! longitude) pair or a [`Diagnostic`].

mod cache;
mod client;
mod extract;
mod policy;
mod query;
mod rate_limit;
mod service;

pub use cache::GeocodeCache;
pub use client::{ClientFactory, ClientProvider, NominatimHttp, PooledClient, ReqwestClientFactory};
pub use extract::{extract_coordinates, Diagnostic, Extraction};
pub use policy::UsagePolicy;
pub use query::{Query, QueryKey};
pub use rate_limit::{Permit, RateLimiter};
pub use service::{CityLocation, CityOutcome, Lookup, NominatimService};
