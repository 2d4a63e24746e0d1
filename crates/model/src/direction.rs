use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single leg's travel distance and duration, as returned by the routing
/// provider (C1) or served from the direction cache (C2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Direction {
    pub distance_in_meter: i64,
    pub duration_in_seconds: i64,
}

/// `"{origin}|{destination}"` — the direction cache's key.
pub fn direction_cache_key(origin: &str, destination: &str) -> String {
    format!("{origin}|{destination}")
}
