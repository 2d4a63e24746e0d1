//! C7: the constraint-programming scheduler. A mixed-integer-linear
//! reformulation of `original_source/app/services/scheduler/cp_sat_scheduler.py`'s
//! `CpSatScheduler` (OR-Tools CP-SAT) against `good_lp` + the `highs`
//! backend (DESIGN.md OQ-2: no CP-SAT binding exists in this stack).
//! `OnlyEnforceIf` becomes the standard big-M linearization.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use database::ProgramRepository;
use good_lp::{constraint, variable, Expression, ProblemVariables, SolverModel, Variable};
use model::{
    MobilityAssistance, Optimization, ScheduleRequest, SchedulerError, SchedulerResult, Shuttle,
    Trip, Vehicle,
};

use crate::builder::{build_trips, BuildConfig, TripRecord};
use crate::{is_debug, DefaultTimings, DirectionLookup};

/// One full day's minutes; the solver's intval bound and the big-M
/// constant for every conditional constraint below.
const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Runs C5, resolves the request's fleet (explicit `program_name`, falling
/// back to the first booking's `program_name` — matching
/// `cp_sat_scheduler.py::_get_vehicles`), then solves.
pub async fn schedule(
    request: &ScheduleRequest,
    directions: &dyn DirectionLookup,
    programs: &ProgramRepository,
    defaults: &DefaultTimings,
) -> SchedulerResult<Vec<Shuttle>> {
    let config = BuildConfig::from_request(request, defaults);
    let trips = build_trips(request, &config, directions).await?;
    let program_name = resolve_program_name(request);
    let vehicles = load_vehicles(programs, program_name.as_deref()).await?;
    let optimization = request.optimization.clone().unwrap_or_default();

    solve(trips, vehicles, &optimization, directions, is_debug(request)).await
}

fn resolve_program_name(request: &ScheduleRequest) -> Option<String> {
    request.program_name.clone().or_else(|| {
        request
            .bookings
            .first()
            .and_then(|booking| booking.program_name.clone())
    })
}

async fn load_vehicles(
    programs: &ProgramRepository,
    program_name: Option<&str>,
) -> SchedulerResult<Vec<Vehicle>> {
    let Some(name) = program_name else {
        return Ok(Vec::new());
    };
    match programs.get_by_name(name).await? {
        Some(program) => Ok(program.vehicles),
        None => Ok(Vec::new()),
    }
}

/// The model/solve/extract core, independent of where trips and vehicles
/// came from — exercised directly by the scenario tests below.
pub async fn solve(
    trips: Vec<TripRecord>,
    vehicles: Vec<Vehicle>,
    optimization: &Optimization,
    directions: &dyn DirectionLookup,
    debug: bool,
) -> SchedulerResult<Vec<Shuttle>> {
    if trips.is_empty() {
        return Ok(Vec::new());
    }

    let num_vehicles = vehicles.len();
    let num_trips = trips.len();

    let mut vars = ProblemVariables::new();

    // x[v,t]: only created for compatible pairs (C7.2 "compatibility" is
    // enforced by construction rather than a constraint).
    let mut x: HashMap<(usize, usize), Variable> = HashMap::new();
    for v in 0..num_vehicles {
        for t in 0..num_trips {
            if vehicles[v].compatible(trips[t].assistance) {
                x.insert((v, t), vars.add(variable().binary()));
            }
        }
    }

    let vehicle_used: Vec<Variable> = (0..num_vehicles)
        .map(|_| vars.add(variable().binary()))
        .collect();

    let time: HashMap<(usize, usize), Variable> = x
        .keys()
        .map(|&key| (key, vars.add(variable().integer().min(0.0).max(MINUTES_PER_DAY))))
        .collect();

    let use_makespan_objective = optimization.minimize_total_duration;
    let start: Vec<Variable> = (0..num_vehicles)
        .map(|_| vars.add(variable().min(0.0).max(MINUTES_PER_DAY)))
        .collect();
    let finish: Vec<Variable> = (0..num_vehicles)
        .map(|_| vars.add(variable().min(0.0).max(MINUTES_PER_DAY)))
        .collect();

    let mut objective = Expression::from(0.0);
    if use_makespan_objective {
        for v in 0..num_vehicles {
            objective += finish[v];
            objective -= start[v];
        }
    } else {
        for v in 0..num_vehicles {
            objective += vehicle_used[v];
        }
    }

    let mut model = vars.minimise(objective).using(good_lp::solvers::highs::highs);

    // C7.1 cover: every trip assigned to exactly one vehicle. A trip with
    // no compatible vehicle at all makes this sum empty == 1 — infeasible,
    // which is a legitimate NoSchedule, but we surface it with a clearer
    // message than "infeasible" up front.
    for t in 0..num_trips {
        let mut sum = Expression::from(0.0);
        let mut any = false;
        for v in 0..num_vehicles {
            if let Some(&xvar) = x.get(&(v, t)) {
                sum += xvar;
                any = true;
            }
        }
        if !any {
            return Err(SchedulerError::NoSchedule(format!(
                "no compatible vehicle for booking {}",
                trips[t].booking.id
            )));
        }
        model = model.with(constraint!(sum == 1.0));
    }

    // vehicle_used[v] >= x[v,t] for every assignable pair.
    for (&(v, _t), &xvar) in x.iter() {
        model = model.with(constraint!(vehicle_used[v] >= xvar));
    }

    // C7.3 pickup bound: time[v,t] <= pickup_minutes(t) when x[v,t].
    for (&(v, t), &tvar) in time.iter() {
        let xvar = x[&(v, t)];
        let pickup_minutes = minutes_of_day(trips[t].pickup_instant, trips[t].pickup_timezone);
        model = model.with(constraint!(
            tvar <= pickup_minutes + MINUTES_PER_DAY * (1.0 - xvar)
        ));
    }

    // C7.4 non-overlap: for each unordered pair, canonicalize into
    // (earlier, later) by pickup instant, ties broken by booking id
    // (DESIGN.md OQ-5), and enforce time[v,later] >= time[v,earlier] +
    // duration(earlier) + dropoff_unloading + travel(earlier->later),
    // whenever both are assigned to the same vehicle v. Pairs with no
    // known connecting route are left unconstrained, mirroring the
    // source's `if direction:` guard.
    for i in 0..num_trips {
        for j in (i + 1)..num_trips {
            let (earlier, later) = order_pair(&trips, i, j);
            let earlier_trip = &trips[earlier];
            let later_trip = &trips[later];

            let travel_sec = if earlier_trip.dropoff_address() == later_trip.pickup_address() {
                Some(0)
            } else {
                directions
                    .fetch(earlier_trip.dropoff_address(), later_trip.pickup_address(), None)
                    .await?
                    .map(|direction| direction.duration_in_seconds)
            };

            let Some(travel_sec) = travel_sec else {
                continue;
            };

            let required_gap_minutes = ((earlier_trip.duration_sec
                + earlier_trip.dropoff_unloading_sec
                + travel_sec)
                / 60) as f64;

            for v in 0..num_vehicles {
                if let (Some(&x_earlier), Some(&x_later)) =
                    (x.get(&(v, earlier)), x.get(&(v, later)))
                {
                    let t_earlier = time[&(v, earlier)];
                    let t_later = time[&(v, later)];
                    model = model.with(constraint!(
                        t_later
                            >= t_earlier + required_gap_minutes
                                - MINUTES_PER_DAY * (2.0 - x_earlier - x_later)
                    ));
                }
            }
        }
    }

    // C7.5 same-passenger chain: pin every pair of a passenger's trips to
    // the same vehicle, for every vehicle that can serve at least one of
    // them (and exclude it from the other when it can't serve both).
    if optimization.chain_bookings_for_same_passenger {
        for i in 0..num_trips {
            for j in (i + 1)..num_trips {
                if trips[i].passenger_key() != trips[j].passenger_key() {
                    continue;
                }
                for v in 0..num_vehicles {
                    match (x.get(&(v, i)), x.get(&(v, j))) {
                        (Some(&xi), Some(&xj)) => {
                            model = model.with(constraint!(xi == xj));
                        }
                        (Some(&xi), None) => {
                            model = model.with(constraint!(xi == 0.0));
                        }
                        (None, Some(&xj)) => {
                            model = model.with(constraint!(xj == 0.0));
                        }
                        (None, None) => {}
                    }
                }
            }
        }
    }

    // Makespan auxiliary constraints, only meaningful (and only added) when
    // the objective uses them.
    if use_makespan_objective {
        for (&(v, t), &tvar) in time.iter() {
            let xvar = x[&(v, t)];
            model = model.with(constraint!(
                start[v] <= tvar + MINUTES_PER_DAY * (1.0 - xvar)
            ));
            let trip_span_minutes =
                ((trips[t].duration_sec + trips[t].dropoff_unloading_sec) as f64) / 60.0;
            model = model.with(constraint!(
                finish[v] >= tvar + trip_span_minutes - MINUTES_PER_DAY * (1.0 - xvar)
            ));
        }
    }

    if debug {
        log::debug!(
            "cp model: {num_vehicles} vehicles, {num_trips} trips, {} assignable pairs",
            x.len()
        );
    }

    let solution = model
        .solve()
        .map_err(|why| SchedulerError::NoSchedule(why.to_string()))?;

    let mut shuttles = Vec::new();
    for v in 0..num_vehicles {
        let used = solution.value(vehicle_used[v]) > 0.5;
        if !used {
            continue;
        }

        let mut assigned: Vec<(usize, f64)> = Vec::new();
        for t in 0..num_trips {
            if let Some(&xvar) = x.get(&(v, t)) {
                if solution.value(xvar) > 0.5 {
                    assigned.push((t, solution.value(time[&(v, t)])));
                }
            }
        }
        if assigned.is_empty() {
            continue;
        }
        assigned.sort_by(|a, b| a.1.partial_cmp(&b.1).expect("finite minute value"));

        let vehicle = &vehicles[v];
        let trips_out: Vec<Trip> = assigned
            .into_iter()
            .map(|(t, start_minute)| to_output_trip(&trips[t], start_minute))
            .collect();

        shuttles.push(Shuttle {
            shuttle_name: vehicle.name.clone(),
            shuttle_id: vehicle.id.clone(),
            shuttle_wheelchair: vehicle
                .mobility_assistance
                .first()
                .map(|assistance| assistance.code().to_owned()),
            shuttle_license_plate: vehicle.license_plate.clone(),
            trips: trips_out,
        });
    }

    Ok(shuttles)
}

fn order_pair(trips: &[TripRecord], i: usize, j: usize) -> (usize, usize) {
    use std::cmp::Ordering;
    match trips[i].pickup_instant.cmp(&trips[j].pickup_instant) {
        Ordering::Less => (i, j),
        Ordering::Greater => (j, i),
        Ordering::Equal => {
            if trips[i].booking.id <= trips[j].booking.id {
                (i, j)
            } else {
                (j, i)
            }
        }
    }
}

fn minutes_of_day(instant: DateTime<Utc>, tz: Tz) -> f64 {
    let local = instant.with_timezone(&tz);
    (local.hour() as f64) * 60.0 + local.minute() as f64
}

fn minutes_to_hhmm(total_minutes: f64) -> String {
    let total = total_minutes.round() as i64;
    let hour = total.rem_euclid(24 * 60) / 60;
    let minute = total.rem_euclid(60);
    format!("{hour:02}:{minute:02}")
}

fn to_output_trip(trip: &TripRecord, start_minute: f64) -> Trip {
    let pickup_str = minutes_to_hhmm(start_minute);
    let dropoff_minute = start_minute + (trip.duration_sec as f64) / 60.0;
    let dropoff_str = minutes_to_hhmm(dropoff_minute);

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

    fn booking(id: &str, passenger: &str, pickup_time: &str, pickup: &str, dropoff: &str) -> Booking {
        Booking {
            id: id.to_owned(),
            first_name: None,
            last_name: None,
            passenger_id: Some(passenger.to_owned()),
            additional_passenger_count: 0,
            mobility_assistance: vec![],
            program_name: Some("default".to_owned()),
            pickup_time: pickup_time.to_owned(),
            pickup_address: format!("{pickup} 10001"),
            dropoff_address: format!("{dropoff} 10001"),
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

    fn vehicle(id: &str, name: &str, assistance: MobilityAssistance) -> Vehicle {
        Vehicle {
            id: id.to_owned(),
            name: name.to_owned(),
            mobility_assistance: vec![assistance],
            license_plate: None,
            capacity: None,
        }
    }

    #[tokio::test]
    async fn two_compatible_trips_fit_one_vehicle() {
        let request = ScheduleRequest {
            date: "June 1, 2024".to_owned(),
            bookings: vec![
                booking("1", "alice", "09:00", "A", "B"),
                booking("2", "bob", "09:20", "B", "C"),
            ],
            before_pickup_time: None,
            after_pickup_time: None,
            pickup_loading_time: None,
            dropoff_unloading_time: None,
            optimization: None,
            program_name: None,
            debug: false,
        };
        let directions = FakeDirections::empty()
            .with_route("A 10001", "B 10001", 5000, 600)
            .with_route("B 10001", "C 10001", 5000, 600);
        let config = BuildConfig::from_request(&request, &DefaultTimings::default());
        let trips = build_trips(&request, &config, &directions).await.unwrap();

        let vehicles = vec![vehicle("v1", "Van 1", MobilityAssistance::Ambulatory)];
        let optimization = Optimization::default();

        let shuttles = solve(trips, vehicles, &optimization, &directions, false)
            .await
            .unwrap();

        assert_eq!(shuttles.len(), 1);
        assert_eq!(shuttles[0].trips.len(), 2);
    }

    #[tokio::test]
    async fn incompatible_assistance_is_infeasible() {
        let request = ScheduleRequest {
            date: "June 1, 2024".to_owned(),
            bookings: vec![Booking {
                mobility_assistance: vec!["STRETCHER".to_owned()],
                ..booking("1", "alice", "09:00", "A", "B")
            }],
            before_pickup_time: None,
            after_pickup_time: None,
            pickup_loading_time: None,
            dropoff_unloading_time: None,
            optimization: None,
            program_name: None,
            debug: false,
        };
        let directions = FakeDirections::empty().with_route("A 10001", "B 10001", 5000, 600);
        let config = BuildConfig::from_request(&request, &DefaultTimings::default());
        let trips = build_trips(&request, &config, &directions).await.unwrap();

        let vehicles = vec![vehicle("v1", "Van 1", MobilityAssistance::Ambulatory)];
        let optimization = Optimization::default();

        let result = solve(trips, vehicles, &optimization, &directions, false).await;
        assert!(matches!(result, Err(SchedulerError::NoSchedule(_))));
    }
}
