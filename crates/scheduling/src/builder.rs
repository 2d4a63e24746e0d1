//! C5: the booking graph builder. Converts a `ScheduleRequest`'s bookings
//! into time-resolved `TripRecord`s, grounded on
//! `original_source/app/services/scheduler/greedy_scheduler.py`'s
//! `TripInfo` (the async `create` classmethod, `_get_trips_from_bookings`,
//! and `_mark_last_leg`). `Booking` and `TripRecord` stay separate owned
//! values here rather than the source's in-place mutation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use model::{Booking, MobilityAssistance, ScheduleRequest, SchedulerError, SchedulerResult};

use crate::{DefaultTimings, DirectionLookup};

/// Resolved per-request timing parameters, with any request-level
/// overrides already applied over the environment defaults.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    pub before_pickup_sec: i64,
    pub after_pickup_sec: i64,
    pub dropoff_unloading_sec: i64,
}

impl BuildConfig {
    pub fn from_request(request: &ScheduleRequest, defaults: &DefaultTimings) -> Self {
        Self {
            before_pickup_sec: request
                .before_pickup_time
                .unwrap_or(defaults.before_pickup_sec),
            after_pickup_sec: request
                .after_pickup_time
                .unwrap_or(defaults.after_pickup_sec),
            dropoff_unloading_sec: request
                .dropoff_unloading_time
                .unwrap_or(defaults.dropoff_unloading_sec),
        }
    }
}

/// The engine's internal, time-resolved representation of a booking. Owns
/// a clone of its source `Booking` rather than a mutable reference to it.
#[derive(Debug, Clone)]
pub struct TripRecord {
    pub booking: Booking,
    pub pickup_instant: DateTime<Utc>,
    pub duration_sec: i64,
    pub distance_m: i64,
    pub assistance: MobilityAssistance,
    pub is_last: bool,
    pub adjusted_pickup_time: Option<DateTime<Utc>>,
    pub earliest_arrival_time: DateTime<Utc>,
    pub after_pickup_sec: i64,
    pub dropoff_unloading_sec: i64,
    pub pickup_timezone: Tz,
}

impl TripRecord {
    pub fn pickup_address(&self) -> &str {
        &self.booking.pickup_address
    }

    pub fn dropoff_address(&self) -> &str {
        &self.booking.dropoff_address
    }

    pub fn passenger_key(&self) -> String {
        self.booking.passenger_key()
    }

    /// The latest instant the vehicle may still begin servicing this
    /// booking: `pickup_instant` for a regular leg, `pickup_instant +
    /// after_pickup_in_sec` for the last leg of a multi-leg day.
    pub fn latest_pickup_time(&self) -> DateTime<Utc> {
        if self.is_last {
            self.pickup_instant + Duration::seconds(self.after_pickup_sec)
        } else {
            self.pickup_instant
        }
    }

    pub fn dropoff_time(&self) -> DateTime<Utc> {
        let base = self.adjusted_pickup_time.unwrap_or(self.pickup_instant);
        base + Duration::seconds(self.duration_sec)
    }

    pub fn finish_time(&self) -> DateTime<Utc> {
        self.dropoff_time() + Duration::seconds(self.dropoff_unloading_sec)
    }

    pub fn short(&self) -> String {
        format!(
            "{} [{}]: {} -> {}{}",
            self.booking.short(),
            self.assistance.code(),
            self.pickup_address(),
            self.dropoff_address(),
            if self.is_last { " [L]" } else { "" }
        )
    }
}

/// Builds and time-resolves every trip in a request. A miss on a booking's
/// own pickup->dropoff leg aborts the whole request with `NoRoute`.
pub async fn build_trips(
    request: &ScheduleRequest,
    config: &BuildConfig,
    directions: &dyn DirectionLookup,
) -> SchedulerResult<Vec<TripRecord>> {
    let mut trips = Vec::with_capacity(request.bookings.len());

    for booking in &request.bookings {
        let pickup_timezone = utility::timezone::timezone_by_address(&booking.pickup_address)
            .ok_or_else(|| {
                SchedulerError::BadInput(format!(
                    "could not determine timezone for pickup address \"{}\"",
                    booking.pickup_address
                ))
            })?;
        let pickup_instant = utility::timezone::resolve_pickup_instant(
            &request.date,
            &booking.pickup_time,
            &booking.pickup_address,
        )?;

        let direction = directions
            .fetch(
                &booking.pickup_address,
                &booking.dropoff_address,
                Some(pickup_instant),
            )
            .await?
            .ok_or_else(|| SchedulerError::NoRoute {
                from: booking.pickup_address.clone(),
                to: booking.dropoff_address.clone(),
            })?;

        let earliest_arrival_time = pickup_instant - Duration::seconds(config.before_pickup_sec);

        trips.push(TripRecord {
            assistance: booking.assistance(),
            booking: booking.clone(),
            pickup_instant,
            duration_sec: direction.duration_in_seconds,
            distance_m: direction.distance_in_meter,
            is_last: false,
            adjusted_pickup_time: None,
            earliest_arrival_time,
            after_pickup_sec: config.after_pickup_sec,
            dropoff_unloading_sec: config.dropoff_unloading_sec,
            pickup_timezone,
        });
    }

    mark_last_leg(&mut trips);

    Ok(trips)
}

/// Sorts trips by pickup instant ascending, groups by passenger, and marks
/// the chronologically latest trip of any passenger with >= 2 trips as
/// `is_last`. That passenger's first trip keeps its `earliest_arrival_time`
/// pinned to its own pickup instant (no pre-arrival credit on the first leg
/// of a multi-leg day). Resolves an ambiguity in the source (see
/// DESIGN.md OQ-4): the *latest*, not earliest, trip is `is_last`.
fn mark_last_leg(trips: &mut [TripRecord]) {
    trips.sort_by_key(|trip| trip.pickup_instant);

    let mut by_passenger: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, trip) in trips.iter().enumerate() {
        by_passenger.entry(trip.passenger_key()).or_default().push(index);
    }

    for indices in by_passenger.values() {
        if indices.len() < 2 {
            continue;
        }
        let last_index = *indices.last().expect("non-empty group");
        trips[last_index].is_last = true;
        let first_index = indices[0];
        trips[first_index].earliest_arrival_time = trips[first_index].pickup_instant;
    }
}

/// Partitions trips into three priority buckets, STRETCHER (0) first,
/// WHEELCHAIR (1) second, AMBULATORY (2) last, preserving each bucket's
/// relative (pickup-ascending) order.
pub fn partition_by_priority(trips: Vec<TripRecord>) -> [Vec<TripRecord>; 3] {
    let mut buckets: [Vec<TripRecord>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for trip in trips {
        buckets[trip.assistance.priority() as usize].push(trip);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests_support::FakeDirections;
    use model::Booking;

    fn booking(id: &str, passenger: &str, pickup_time: &str, addr: &str) -> Booking {
        Booking {
            id: id.to_owned(),
            first_name: None,
            last_name: None,
            passenger_id: Some(passenger.to_owned()),
            additional_passenger_count: 0,
            mobility_assistance: vec![],
            program_name: None,
            pickup_time: pickup_time.to_owned(),
            pickup_address: format!("{addr} 10001"),
            dropoff_address: "200 Elsewhere Ave 10001".to_owned(),
            ride_status: 0,
            pickup_lat: None,
            pickup_lon: None,
            dropoff_lat: None,
            dropoff_lon: None,
            total_seat_count: None,
            ride_fee: None,
            admin_note: None,
            trip_id: None,
            program_id: None,
            program_timezone: None,
            travel_distance: None,
            travel_time: None,
            scheduled_pickup_time: None,
            scheduled_dropoff_time: None,
        }
    }

    #[tokio::test]
    async fn last_leg_is_the_chronologically_latest() {
        let request = ScheduleRequest {
            date: "June 1, 2024".to_owned(),
            bookings: vec![
                booking("1", "alice", "17:00", "100 Home St"),
                booking("2", "alice", "09:00", "100 Home St"),
            ],
            before_pickup_time: None,
            after_pickup_time: None,
            pickup_loading_time: None,
            dropoff_unloading_time: None,
            optimization: None,
            program_name: None,
            debug: false,
        };
        let config = BuildConfig::from_request(&request, &DefaultTimings::default());
        let directions = FakeDirections::uniform(5000, 600);

        let trips = build_trips(&request, &config, &directions).await.unwrap();

        assert_eq!(trips.len(), 2);
        // Sorted ascending: 09:00 first, 17:00 second.
        assert_eq!(trips[0].booking.id, "2");
        assert!(!trips[0].is_last);
        assert_eq!(trips[0].earliest_arrival_time, trips[0].pickup_instant);
        assert_eq!(trips[1].booking.id, "1");
        assert!(trips[1].is_last);
    }

    #[tokio::test]
    async fn single_trip_passenger_is_never_last() {
        let request = ScheduleRequest {
            date: "June 1, 2024".to_owned(),
            bookings: vec![booking("1", "bob", "09:00", "100 Home St")],
            before_pickup_time: None,
            after_pickup_time: None,
            pickup_loading_time: None,
            dropoff_unloading_time: None,
            optimization: None,
            program_name: None,
            debug: false,
        };
        let config = BuildConfig::from_request(&request, &DefaultTimings::default());
        let directions = FakeDirections::uniform(5000, 600);

        let trips = build_trips(&request, &config, &directions).await.unwrap();
        assert!(!trips[0].is_last);
    }

    #[tokio::test]
    async fn missing_route_on_own_leg_is_no_route() {
        let request = ScheduleRequest {
            date: "June 1, 2024".to_owned(),
            bookings: vec![booking("1", "bob", "09:00", "100 Home St")],
            before_pickup_time: None,
            after_pickup_time: None,
            pickup_loading_time: None,
            dropoff_unloading_time: None,
            optimization: None,
            program_name: None,
            debug: false,
        };
        let config = BuildConfig::from_request(&request, &DefaultTimings::default());
        let directions = FakeDirections::empty();

        let result = build_trips(&request, &config, &directions).await;
        assert!(matches!(result, Err(SchedulerError::NoRoute { .. })));
    }
}

/// Shared in-memory fakes for `builder`/`greedy`/`cp` scenario tests,
/// standing in for `DirectionCache`/`RoutingProvider`.
#[cfg(test)]
pub(crate) mod tests_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use model::{Direction, SchedulerResult};

    use crate::DirectionLookup;

    /// A direction lookup fake keyed on `(origin, destination)`, with an
    /// optional uniform fallback for unlisted pairs.
    pub struct FakeDirections {
        routes: Mutex<HashMap<(String, String), Option<Direction>>>,
        uniform: Option<Direction>,
    }

    impl FakeDirections {
        pub fn empty() -> Self {
            Self {
                routes: Mutex::new(HashMap::new()),
                uniform: None,
            }
        }

        pub fn uniform(distance_in_meter: i64, duration_in_seconds: i64) -> Self {
            Self {
                routes: Mutex::new(HashMap::new()),
                uniform: Some(Direction {
                    distance_in_meter,
                    duration_in_seconds,
                }),
            }
        }

        pub fn with_route(
            self,
            origin: &str,
            destination: &str,
            distance_in_meter: i64,
            duration_in_seconds: i64,
        ) -> Self {
            self.routes.lock().unwrap().insert(
                (origin.to_owned(), destination.to_owned()),
                Some(Direction {
                    distance_in_meter,
                    duration_in_seconds,
                }),
            );
            self
        }

        pub fn with_no_route(self, origin: &str, destination: &str) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert((origin.to_owned(), destination.to_owned()), None);
            self
        }
    }

    #[async_trait]
    impl DirectionLookup for FakeDirections {
        async fn fetch(
            &self,
            origin: &str,
            destination: &str,
            _depart_time: Option<DateTime<Utc>>,
        ) -> SchedulerResult<Option<Direction>> {
            let key = (origin.to_owned(), destination.to_owned());
            if let Some(entry) = self.routes.lock().unwrap().get(&key) {
                return Ok(*entry);
            }
            if origin == destination {
                return Ok(Some(Direction {
                    distance_in_meter: 0,
                    duration_in_seconds: 0,
                }));
            }
            Ok(self.uniform)
        }
    }
}
