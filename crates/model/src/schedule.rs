use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::booking::Booking;
use crate::shuttle::Shuttle;

/// Objective flags for the CP scheduler (C7). Ignored by the greedy
/// scheduler (C6), which always runs its priority-ordered best-fit pass.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    #[serde(default = "default_true")]
    pub chain_bookings_for_same_passenger: bool,
    #[serde(default = "default_true")]
    pub minimize_vehicles: bool,
    #[serde(default)]
    pub minimize_total_duration: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Optimization {
    fn default() -> Self {
        Self {
            chain_bookings_for_same_passenger: true,
            minimize_vehicles: true,
            minimize_total_duration: false,
        }
    }
}

/// The body of `POST /schedule` and `POST /task`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// "Month Day, Year", e.g. "June 1, 2024".
    pub date: String,
    pub bookings: Vec<Booking>,
    pub before_pickup_time: Option<i64>,
    pub after_pickup_time: Option<i64>,
    pub pickup_loading_time: Option<i64>,
    pub dropoff_unloading_time: Option<i64>,
    pub optimization: Option<Optimization>,
    /// When set, routes through the CP scheduler (C7) against this fleet;
    /// when absent, the greedy scheduler (C6) runs fleet-agnostic.
    pub program_name: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResultData {
    pub vehicle_trip_list: Vec<Shuttle>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub status: String,
    pub error_code: i32,
    pub message: String,
    pub data: Option<ScheduleResultData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub result: ScheduleResult,
}

impl ScheduleResponse {
    pub fn success(shuttles: Vec<Shuttle>) -> Self {
        Self {
            result: ScheduleResult {
                status: "success".to_owned(),
                error_code: 0,
                message: "Successfully retrieved trips data.".to_owned(),
                data: Some(ScheduleResultData {
                    vehicle_trip_list: shuttles,
                }),
            },
        }
    }

    /// Used for `NoSchedule`: not an HTTP error, a successfully-formed
    /// response whose body says no plan could be found.
    pub fn no_schedule(message: impl Into<String>) -> Self {
        Self {
            result: ScheduleResult {
                status: "error".to_owned(),
                error_code: 1,
                message: message.into(),
                data: None,
            },
        }
    }
}
