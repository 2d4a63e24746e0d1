use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::booking::Booking;

/// One scheduled leg in the output plan. Built fresh from a `Booking` and
/// the scheduler's resolved times — never by mutating the input booking.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub trip_id: Option<String>,
    pub program_id: Option<String>,
    pub program_name: Option<String>,
    pub program_timezone: Option<String>,

    pub first_pickup_time: String,
    pub first_pickup_address: String,
    pub last_dropoff_time: String,
    pub last_dropoff_address: String,

    pub notes: Option<String>,
    pub number_of_passengers: i32,
    pub trip_complete: bool,

    pub bookings: Vec<Booking>,
}

impl Trip {
    pub fn short(&self) -> String {
        format!(
            "{} -> {} [{} .. {}]",
            self.first_pickup_address,
            self.last_dropoff_address,
            self.first_pickup_time,
            self.last_dropoff_time
        )
    }
}
