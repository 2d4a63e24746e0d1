use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mobility_assistance::MobilityAssistance;

/// A passenger's ride request for a specific pickup time and address pair.
///
/// Required fields follow the engine's invariants; the remaining fields are
/// passed through unchanged to the output `Trip` without participating in
/// any scheduling decision.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub passenger_id: Option<String>,
    #[serde(default)]
    pub additional_passenger_count: i32,
    #[serde(default)]
    pub mobility_assistance: Vec<String>,
    pub program_name: Option<String>,

    /// `HH:MM`, local to the pickup address's timezone.
    #[schemars(schema_with = "utility::serde::hhmm::schema")]
    pub pickup_time: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    #[serde(default)]
    pub ride_status: i32,

    // Passthrough fields: carried unchanged onto the output Trip/Booking,
    // never read by the scheduling algorithms themselves.
    pub pickup_lat: Option<f64>,
    pub pickup_lon: Option<f64>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lon: Option<f64>,
    pub total_seat_count: Option<i32>,
    pub ride_fee: Option<f64>,
    pub admin_note: Option<String>,
    pub trip_id: Option<String>,
    pub program_id: Option<String>,
    pub program_timezone: Option<String>,

    // Filled in by the booking graph builder (C5) once travel legs are
    // resolved; absent on the inbound request.
    pub travel_distance: Option<i64>,
    pub travel_time: Option<i64>,

    // Filled in by a scheduler (C6/C7) on the output booking only; never
    // read back in, and never set on the value the client sent.
    pub scheduled_pickup_time: Option<String>,
    pub scheduled_dropoff_time: Option<String>,
}

impl Booking {
    /// The passenger identity used for grouping multi-trip days: the
    /// explicit `passenger_id` if present, otherwise "first last".
    pub fn passenger_key(&self) -> String {
        if let Some(id) = &self.passenger_id {
            return id.clone();
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.id.clone(),
        }
    }

    pub fn assistance(&self) -> MobilityAssistance {
        MobilityAssistance::parse_list(&self.mobility_assistance)
    }

    pub fn short(&self) -> String {
        format!(
            "{} ({}) {} -> {}",
            self.id,
            self.passenger_key(),
            self.pickup_address,
            self.dropoff_address
        )
    }
}
