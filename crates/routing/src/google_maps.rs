use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::Direction;
use serde::Deserialize;

use crate::{ProviderError, ProviderOutcome, RoutingProvider};

const DIRECTIONS_API_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// A thin reqwest wrapper over the Google Maps Directions API, the
/// provider `original_source/app/services/direction_service.py` called via
/// the `googlemaps` Python client. `mode=driving` is the only mode this
/// system ever needs.
pub struct GoogleMapsProvider {
    api_key: String,
    http: reqwest::Client,
}

impl GoogleMapsProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: DirectionsValue,
    duration: DirectionsValue,
}

#[derive(Debug, Deserialize)]
struct DirectionsValue {
    value: i64,
}

#[async_trait]
impl RoutingProvider for GoogleMapsProvider {
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        depart_time: Option<DateTime<Utc>>,
    ) -> Result<ProviderOutcome, ProviderError> {
        let mut query = vec![
            ("origin", origin.to_owned()),
            ("destination", destination.to_owned()),
            ("mode", "driving".to_owned()),
            ("key", self.api_key.clone()),
        ];
        if let Some(depart_time) = depart_time {
            query.push(("departure_time", depart_time.timestamp().to_string()));
        }

        log::debug!("routing provider request: {origin} -> {destination}");

        let response = self
            .http
            .get(DIRECTIONS_API_URL)
            .query(&query)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;

        if body.status == "ZERO_RESULTS" {
            return Ok(ProviderOutcome::NoRoute);
        }
        if body.status != "OK" {
            return Err(ProviderError::InvalidResponse(body.status));
        }

        let leg = body
            .routes
            .first()
            .and_then(|route| route.legs.first());

        match leg {
            Some(leg) => Ok(ProviderOutcome::Found(Direction {
                distance_in_meter: leg.distance.value,
                duration_in_seconds: leg.duration.value,
            })),
            None => Ok(ProviderOutcome::NoRoute),
        }
    }
}
