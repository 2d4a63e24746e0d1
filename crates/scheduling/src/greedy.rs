//! C6: the greedy scheduler. Priority-ordered best-fit assignment of trips
//! to shuttles, creating shuttles on demand. Grounded on
//! `original_source/app/services/scheduler/greedy_scheduler.py`
//! (`GreedyScheduler`, `ShuttleInfo`, `_schedule_trips`, `_is_trip_fit`,
//! `_is_better`).

use chrono::{DateTime, Duration, Utc};
use model::{MobilityAssistance, ScheduleRequest, Shuttle, SchedulerResult, Trip};

use crate::builder::{build_trips, partition_by_priority, BuildConfig, TripRecord};
use crate::{is_debug, DefaultTimings, DirectionLookup};

/// A shuttle under construction: 1-based insertion order plus its trips in
/// assignment order.
struct ShuttleBuild {
    index: usize,
    trips: Vec<TripRecord>,
}

impl ShuttleBuild {
    /// The assistance type of a shuttle is that of its first trip — the
    /// source reads `self.trips[0]` via an early-returning loop
    /// (`ShuttleInfo.assistance`); later trips never change it because
    /// nothing downstream of assignment re-derives it.
    fn assistance(&self) -> MobilityAssistance {
        self.trips
            .first()
            .map(|trip| trip.assistance)
            .unwrap_or(MobilityAssistance::Ambulatory)
    }

    fn name(&self) -> String {
        format!("{}{}", self.index, self.assistance().code())
    }
}

/// Runs C5 then C6 end to end, producing the plan for a synchronous
/// `/schedule` request (or the async task pipeline) when no `program_name`
/// routes the request through the CP scheduler instead.
pub async fn schedule(
    request: &ScheduleRequest,
    directions: &dyn DirectionLookup,
    defaults: &DefaultTimings,
) -> SchedulerResult<Vec<Shuttle>> {
    let config = BuildConfig::from_request(request, defaults);
    let trips = build_trips(request, &config, directions).await?;
    schedule_trips(trips, directions, &config, is_debug(request)).await
}

/// The assignment pass itself, taking already-built trips — split out so
/// tests can drive it directly against hand-built `TripRecord`s.
pub async fn schedule_trips(
    trips: Vec<TripRecord>,
    directions: &dyn DirectionLookup,
    config: &BuildConfig,
    debug: bool,
) -> SchedulerResult<Vec<Shuttle>> {
    let buckets = partition_by_priority(trips);

    if debug {
        let summary: Vec<String> = buckets
            .iter()
            .enumerate()
            .map(|(priority, bucket)| format!("{priority}: {}", bucket.len()))
            .collect();
        log::debug!("priority trips: {}", summary.join(", "));
    }

    let mut plan: Vec<ShuttleBuild> = Vec::new();
    for bucket in buckets {
        schedule_bucket(&mut plan, bucket, directions, config, debug).await?;
    }

    Ok(plan.into_iter().map(to_shuttle).collect())
}

async fn schedule_bucket(
    plan: &mut Vec<ShuttleBuild>,
    trips: Vec<TripRecord>,
    directions: &dyn DirectionLookup,
    config: &BuildConfig,
    debug: bool,
) -> SchedulerResult<()> {
    for mut trip in trips {
        if debug {
            log::debug!("[schedule] {}", trip.short());
        }

        let mut best_index: Option<usize> = None;
        let mut best_arrival: Option<DateTime<Utc>> = None;

        for (index, shuttle) in plan.iter().enumerate() {
            let arrival = fits(shuttle, &trip, directions).await?;
            match arrival {
                None => {
                    if debug {
                        log::debug!("  [no] {}", shuttle.name());
                    }
                }
                Some(arrival) => match best_arrival {
                    None => {
                        best_index = Some(index);
                        best_arrival = Some(arrival);
                    }
                    Some(current) => {
                        if is_better(arrival, current, &trip, config) {
                            best_index = Some(index);
                            best_arrival = Some(arrival);
                        }
                    }
                },
            }
        }

        trip.adjusted_pickup_time = Some(match best_arrival {
            Some(arrival) if arrival >= trip.pickup_instant => arrival,
            _ => trip.pickup_instant,
        });

        match best_index {
            Some(index) => {
                trip.earliest_arrival_time =
                    best_arrival.expect("best_index implies best_arrival");
                plan[index].trips.push(trip);
            }
            None => {
                let index = plan.len() + 1;
                if debug {
                    log::debug!("[decision] new shuttle {index}{}", trip.assistance.code());
                }
                plan.push(ShuttleBuild {
                    index,
                    trips: vec![trip],
                });
            }
        }
    }
    Ok(())
}

/// Can `shuttle` accept `trip` next? Returns the estimated arrival time at
/// `trip`'s pickup if so. A `NoRoute` on the connecting leg skips this
/// shuttle rather than failing the whole request.
async fn fits(
    shuttle: &ShuttleBuild,
    trip: &TripRecord,
    directions: &dyn DirectionLookup,
) -> SchedulerResult<Option<DateTime<Utc>>> {
    let last = shuttle.trips.last().expect("shuttles are never empty");

    if last.finish_time() > trip.latest_pickup_time() {
        return Ok(None);
    }

    if last.dropoff_address() == trip.pickup_address() {
        return Ok(Some(last.finish_time()));
    }

    let connection = directions
        .fetch(
            last.dropoff_address(),
            trip.pickup_address(),
            Some(last.finish_time()),
        )
        .await?;
    let Some(connection) = connection else {
        return Ok(None);
    };

    let estimated_arrival = last.finish_time() + Duration::seconds(connection.duration_in_seconds);
    if estimated_arrival > trip.latest_pickup_time() {
        return Ok(None);
    }
    Ok(Some(estimated_arrival))
}

/// `coming` vs `current` candidate arrival, for `trip`. Earlier-is-better
/// once the running best has already missed the trip's early-arrival
/// target (or, for a last leg, its booked pickup); otherwise later is
/// better (minimize idle wait at the pickup point).
fn is_better(coming: DateTime<Utc>, current: DateTime<Utc>, trip: &TripRecord, config: &BuildConfig) -> bool {
    let threshold = if trip.is_last {
        trip.pickup_instant
    } else {
        trip.pickup_instant - Duration::seconds(config.before_pickup_sec)
    };

    if current > threshold {
        coming < current
    } else {
        coming > current
    }
}

fn to_shuttle(build: ShuttleBuild) -> Shuttle {
    let name = build.name();
    let wheelchair = build.assistance().code().to_owned();
    Shuttle {
        shuttle_name: name,
        shuttle_id: utility::id::new_shuttle_id(),
        shuttle_wheelchair: Some(wheelchair),
        shuttle_license_plate: None,
        trips: build.trips.iter().map(to_output_trip).collect(),
    }
}

fn to_output_trip(trip: &TripRecord) -> Trip {
    let adjusted_pickup = trip.adjusted_pickup_time.unwrap_or(trip.pickup_instant);
    let dropoff = trip.dropoff_time();
    let local_pickup = adjusted_pickup.with_timezone(&trip.pickup_timezone);
    let local_dropoff = dropoff.with_timezone(&trip.pickup_timezone);
    let pickup_str = utility::timezone::to_24hr(local_pickup);
    let dropoff_str = utility::timezone::to_24hr(local_dropoff);

    let mut booking = trip.booking.clone();
    booking.scheduled_pickup_time = Some(pickup_str.clone());
    booking.scheduled_dropoff_time = Some(dropoff_str.clone());

    Trip {
        trip_id: booking.trip_id.clone(),
        program_id: booking.program_id.clone(),
        program_name: booking.program_name.clone(),
        program_timezone: booking.program_timezone.clone(),
        first_pickup_time: pickup_str,
        first_pickup_address: booking.pickup_address.clone(),
        last_dropoff_time: dropoff_str,
        last_dropoff_address: booking.dropoff_address.clone(),
        notes: booking.admin_note.clone(),
        number_of_passengers: 1 + booking.additional_passenger_count,
        trip_complete: false,
        bookings: vec![booking],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests_support::FakeDirections;
    use model::Booking;

    fn request(bookings: Vec<Booking>) -> ScheduleRequest {
        ScheduleRequest {
            date: "June 1, 2024".to_owned(),
            bookings,
            before_pickup_time: None,
            after_pickup_time: None,
            pickup_loading_time: None,
            dropoff_unloading_time: None,
            optimization: None,
            program_name: None,
            debug: false,
        }
    }

    fn booking(
        id: &str,
        passenger: &str,
        pickup_time: &str,
        pickup_addr: &str,
        dropoff_addr: &str,
        assistance: &[&str],
    ) -> Booking {
        Booking {
            id: id.to_owned(),
            first_name: None,
            last_name: None,
            passenger_id: Some(passenger.to_owned()),
            additional_passenger_count: 0,
            mobility_assistance: assistance.iter().map(|s| s.to_string()).collect(),
            program_name: None,
            pickup_time: pickup_time.to_owned(),
            pickup_address: format!("{pickup_addr} 10001"),
            dropoff_address: format!("{dropoff_addr} 10001"),
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
    async fn single_ambulatory_booking() {
        let req = request(vec![booking("1", "alice", "09:00", "A", "B", &[])]);
        let directions = FakeDirections::empty().with_route("A 10001", "B 10001", 5000, 600);
        let defaults = DefaultTimings::default();

        let shuttles = schedule(&req, &directions, &defaults).await.unwrap();

        assert_eq!(shuttles.len(), 1);
        assert_eq!(shuttles[0].shuttle_name, "1AMBI");
        assert_eq!(shuttles[0].trips.len(), 1);
        assert_eq!(shuttles[0].trips[0].first_pickup_time, "09:00");
        assert_eq!(shuttles[0].trips[0].last_dropoff_time, "09:10");
    }

    #[tokio::test]
    async fn two_bookings_fit_one_shuttle() {
        let req = request(vec![
            booking("1", "alice", "09:00", "A", "B", &[]),
            booking("2", "bob", "09:20", "B", "C", &[]),
        ]);
        let directions = FakeDirections::empty()
            .with_route("A 10001", "B 10001", 5000, 600)
            .with_route("B 10001", "C 10001", 5000, 600);
        let defaults = DefaultTimings::default();

        let shuttles = schedule(&req, &directions, &defaults).await.unwrap();

        assert_eq!(shuttles.len(), 1);
        assert_eq!(shuttles[0].trips.len(), 2);
        // finish(1) = 09:00+600s+300s unload = 09:15, arrival = 09:15 < 09:20 pickup.
        assert_eq!(shuttles[0].trips[1].first_pickup_time, "09:20");
    }

    #[tokio::test]
    async fn two_bookings_cannot_share_a_shuttle() {
        let req = request(vec![
            booking("1", "alice", "09:00", "A", "B", &[]),
            booking("2", "bob", "09:05", "C", "D", &[]),
        ]);
        let directions = FakeDirections::empty()
            .with_route("A 10001", "B 10001", 5000, 600)
            .with_route("C 10001", "D 10001", 5000, 600)
            .with_route("B 10001", "C 10001", 10000, 1200);
        let defaults = DefaultTimings::default();

        let shuttles = schedule(&req, &directions, &defaults).await.unwrap();

        assert_eq!(shuttles.len(), 2);
    }

    #[tokio::test]
    async fn last_leg_is_granted_after_pickup_grace_but_first_leg_is_not() {
        // alice: 09:00 Home->Work (first leg), 17:00 Work->Home (last leg).
        // bob's 16:50 trip keeps the same shuttle busy until 17:05 (pickup
        // 16:50 + 600s ride + 300s unload), which only lands exactly on
        // alice's last-leg latest_pickup_time (17:00 + after_pickup=300s).
        // The shuttle can still take alice's last leg only because is_last
        // grants that grace; her first leg never gets such slack.
        let req = request(vec![
            booking("1", "alice", "09:00", "Home", "Work", &[]),
            booking("2", "bob", "16:50", "Elsewhere", "Work", &[]),
            booking("3", "alice", "17:00", "Work", "Home", &[]),
        ]);
        let directions = FakeDirections::uniform(5000, 600);
        let defaults = DefaultTimings::default();

        let shuttles = schedule(&req, &directions, &defaults).await.unwrap();
        assert_eq!(shuttles.len(), 1, "bob's trip and both of alice's legs share one shuttle");

        let all_trips: Vec<_> = shuttles.iter().flat_map(|s| &s.trips).collect();

        let morning = all_trips
            .iter()
            .find(|t| t.first_pickup_address == "Home 10001")
            .expect("morning trip present");
        assert_eq!(morning.first_pickup_time, "09:00");

        let evening = all_trips
            .iter()
            .find(|t| t.first_pickup_address == "Work 10001")
            .expect("evening trip present");
        // Delayed past its literal 17:00 booking, which is only tolerable
        // because the last leg of a passenger's day may slip by up to
        // after_pickup_in_sec (I5); a non-last trip would have rejected
        // this shuttle instead of accepting the delay.
        assert_eq!(evening.first_pickup_time, "17:05");
    }

    #[tokio::test]
    async fn stretcher_is_scheduled_before_ambulatory() {
        let req = request(vec![
            booking("1", "alice", "09:00", "A", "B", &[]),
            booking("2", "bob", "10:00", "C", "D", &["STRETCHER"]),
        ]);
        let directions = FakeDirections::uniform(5000, 600);
        let defaults = DefaultTimings::default();

        let shuttles = schedule(&req, &directions, &defaults).await.unwrap();

        assert_eq!(shuttles.len(), 2);
        assert_eq!(shuttles[0].shuttle_name, "1GUR");
        assert_eq!(shuttles[1].shuttle_name, "2AMBI");
    }

    #[tokio::test]
    async fn no_route_on_own_leg_fails_the_request() {
        let req = request(vec![booking("1", "alice", "09:00", "A", "B", &[])]);
        let directions = FakeDirections::empty();
        let defaults = DefaultTimings::default();

        let result = schedule(&req, &directions, &defaults).await;
        assert!(result.is_err());
    }
}
