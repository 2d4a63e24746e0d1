//! The scheduling engine: C5 (booking graph builder), C6 (greedy
//! scheduler), C7 (CP scheduler), and C9 (task executor), plus the
//! `DirectionLookup` seam the first three plug into.

pub mod builder;
pub mod cp;
pub mod executor;
pub mod greedy;

pub use builder::{build_trips, BuildConfig, TripRecord};
pub use model::{SchedulerError, SchedulerResult};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::directions::{FetchError, FetchOutcome};
use database::DirectionCache;
use model::Direction;
use routing::RoutingProvider;

/// Default timing parameters (seconds), overridable per request. Grounded
/// on `original_source/app/services/scheduler/__init__.py`'s
/// `DEFAULT_BEFORE_PICKUP_TIME`/`DEFAULT_AFTER_PICKUP_TIME`/
/// `DEFAULT_DROPOFF_UNLOADING_TIME` environment defaults.
#[derive(Debug, Clone, Copy)]
pub struct DefaultTimings {
    pub before_pickup_sec: i64,
    pub after_pickup_sec: i64,
    pub dropoff_unloading_sec: i64,
}

impl Default for DefaultTimings {
    fn default() -> Self {
        Self {
            before_pickup_sec: 300,
            after_pickup_sec: 300,
            dropoff_unloading_sec: 300,
        }
    }
}

impl DefaultTimings {
    pub fn from_env() -> Self {
        fn read(name: &str, fallback: i64) -> i64 {
            std::env::var(name)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(fallback)
        }
        Self {
            before_pickup_sec: read("DEFAULT_BEFORE_PICKUP_TIME", 300),
            after_pickup_sec: read("DEFAULT_AFTER_PICKUP_TIME", 300),
            dropoff_unloading_sec: read("DEFAULT_DROPOFF_UNLOADING_TIME", 300),
        }
    }
}

/// A direction lookup abstraction the scheduling algorithms run against,
/// separating C5/C6/C7 from the concrete `database::DirectionCache` +
/// `routing::RoutingProvider` pairing so scenario tests can substitute an
/// in-memory fake. Mirrors the `Repo`/`Database` trait seam idiom: keep the
/// algorithm generic over its storage/transport.
#[async_trait]
pub trait DirectionLookup: Send + Sync {
    /// `Ok(None)` means the provider succeeded but returned no route
    /// (`NoRoute`, a soft outcome the caller decides how to handle).
    async fn fetch(
        &self,
        origin: &str,
        destination: &str,
        depart_time: Option<DateTime<Utc>>,
    ) -> SchedulerResult<Option<Direction>>;
}

/// The production `DirectionLookup`: a direction cache (C2) backed by a
/// single-flight miss-fill through a routing provider (C1).
pub struct CachedDirectionLookup<'a> {
    pub cache: &'a DirectionCache,
    pub provider: &'a dyn RoutingProvider,
}

#[async_trait]
impl<'a> DirectionLookup for CachedDirectionLookup<'a> {
    async fn fetch(
        &self,
        origin: &str,
        destination: &str,
        depart_time: Option<DateTime<Utc>>,
    ) -> SchedulerResult<Option<Direction>> {
        let outcome = self
            .cache
            .fetch(origin, destination, depart_time, self.provider)
            .await;
        match outcome {
            Ok(FetchOutcome::Found(direction)) => Ok(Some(direction)),
            Ok(FetchOutcome::NoRoute) => Ok(None),
            Err(FetchError::Provider(why)) => {
                Err(SchedulerError::ProviderError(why.to_string()))
            }
            Err(FetchError::Database(why)) => Err(SchedulerError::Internal(why.to_string())),
        }
    }
}

/// Whether debug-mode structured logging is active for a request: either
/// the request opted in, or `DEBUG_MODE` is set.
pub fn is_debug(request: &model::ScheduleRequest) -> bool {
    request.debug || std::env::var("DEBUG_MODE").map(|v| v == "true").unwrap_or(true)
}

/// Routes a request to the right scheduler: the CP scheduler (C7) when
/// `optimization` objectives are requested, the greedy scheduler (C6)
/// otherwise. Fleet resolution for the CP path (`program_name`, falling
/// back to the first booking's `program_name`) is a separate concern
/// handled by `cp::resolve_program_name`. The shared entry point for both
/// the synchronous `/schedule` handler and the task executor (C9).
pub async fn run(
    request: &model::ScheduleRequest,
    directions: &dyn DirectionLookup,
    programs: &database::ProgramRepository,
    defaults: &DefaultTimings,
) -> SchedulerResult<Vec<model::Shuttle>> {
    if request.optimization.is_some() {
        cp::schedule(request, directions, programs, defaults).await
    } else {
        greedy::schedule(request, directions, defaults).await
    }
}
