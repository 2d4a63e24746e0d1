//! C1: the routing provider adapter. Issues a single remote call mapping
//! `(origin, destination, [depart_time])` to `(meters, seconds)`. Stateless
//! by design — all caching lives one layer up, in the direction cache (C2).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::Direction;

mod google_maps;

pub use google_maps::GoogleMapsProvider;

#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    /// The provider returned at least one leg.
    Found(Direction),
    /// The provider succeeded but returned no legs (no route exists).
    NoRoute,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("routing provider request failed: {0}")]
    Transport(String),
    #[error("routing provider returned an unexpected response: {0}")]
    InvalidResponse(String),
}

/// A single-call routing lookup, e.g. a Google Maps Directions API client.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        depart_time: Option<DateTime<Utc>>,
    ) -> Result<ProviderOutcome, ProviderError>;
}
