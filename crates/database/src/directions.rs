use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use model::{direction_cache_key, Direction};
use routing::{ProviderError, ProviderOutcome, RoutingProvider};

use crate::error::{convert_sqlx_error, DatabaseError};

#[derive(Debug, sqlx::FromRow)]
struct DirectionRow {
    distance_in_meter: i64,
    duration_in_seconds: i64,
    created_at: chrono::DateTime<Utc>,
}

/// C2: a content-addressed cache of `(origin, destination) -> (meters,
/// seconds)`, backed by the `directions` table, with TTL expiry checked on
/// read and single-flight population via a routing provider (C1).
#[derive(Clone)]
pub struct DirectionCache {
    pool: sqlx::PgPool,
    ttl: Duration,
    in_flight: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl DirectionCache {
    pub fn new(pool: sqlx::PgPool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reads the stored entry, honoring the TTL strictly on read rather than
    /// relying solely on the reaper.
    pub async fn lookup(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Option<Direction>, DatabaseError> {
        let key = direction_cache_key(origin, destination);
        let row: Option<DirectionRow> =
            sqlx::query_as("SELECT distance_in_meter, duration_in_seconds, created_at FROM directions WHERE key = $1")
                .bind(&key)
                .fetch_optional(&self.pool)
                .await
                .map_err(convert_sqlx_error)?;

        Ok(row.and_then(|row| {
            let age = Utc::now().signed_duration_since(row.created_at);
            let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_default();
            if age > ttl {
                None
            } else {
                Some(Direction {
                    distance_in_meter: row.distance_in_meter,
                    duration_in_seconds: row.duration_in_seconds,
                })
            }
        }))
    }

    pub async fn store(
        &self,
        origin: &str,
        destination: &str,
        direction: Direction,
    ) -> Result<(), DatabaseError> {
        let key = direction_cache_key(origin, destination);
        sqlx::query(
            "INSERT INTO directions (key, distance_in_meter, duration_in_seconds, created_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (key) DO UPDATE SET
                distance_in_meter = EXCLUDED.distance_in_meter,
                duration_in_seconds = EXCLUDED.duration_in_seconds,
                created_at = EXCLUDED.created_at",
        )
        .bind(&key)
        .bind(direction.distance_in_meter)
        .bind(direction.duration_in_seconds)
        .execute(&self.pool)
        .await
        .map_err(convert_sqlx_error)?;
        Ok(())
    }

    /// Composite lookup/miss-fill used by the booking graph builder (C5)
    /// and greedy scheduler (C6). Concurrent calls for the same key
    /// serialize on a per-key lock so only one provider call is in flight;
    /// losers re-check the cache once they acquire the lock instead of
    /// calling the provider again.
    pub async fn fetch(
        &self,
        origin: &str,
        destination: &str,
        depart_time: Option<chrono::DateTime<Utc>>,
        provider: &dyn RoutingProvider,
    ) -> Result<FetchOutcome, FetchError> {
        if let Some(hit) = self.lookup(origin, destination).await? {
            return Ok(FetchOutcome::Found(hit));
        }

        let key = direction_cache_key(origin, destination);
        let gate = {
            let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
            in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let _permit = gate.lock().await;

        // Re-check: a previous holder of this key's lock may have already
        // populated the cache while we waited.
        if let Some(hit) = self.lookup(origin, destination).await? {
            self.in_flight.lock().expect("in-flight lock poisoned").remove(&key);
            return Ok(FetchOutcome::Found(hit));
        }

        let outcome = provider
            .directions(origin, destination, depart_time)
            .await;

        self.in_flight.lock().expect("in-flight lock poisoned").remove(&key);

        match outcome {
            Ok(ProviderOutcome::Found(direction)) => {
                self.store(origin, destination, direction).await?;
                Ok(FetchOutcome::Found(direction))
            }
            Ok(ProviderOutcome::NoRoute) => Ok(FetchOutcome::NoRoute),
            Err(err) => Err(FetchError::Provider(err)),
        }
    }
}

pub enum FetchOutcome {
    Found(Direction),
    NoRoute,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
