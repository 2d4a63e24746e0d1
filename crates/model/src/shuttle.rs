use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::trip::Trip;

/// A vehicle identity plus its ordered trip list. Shuttle ordering within a
/// plan is stable and reflects the order of first assignment; `shuttle_name`
/// is derived (`"{index}{assistance_code}"`), never stored independently.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shuttle {
    pub shuttle_name: String,
    pub shuttle_id: String,
    pub shuttle_wheelchair: Option<String>,
    pub shuttle_license_plate: Option<String>,
    pub trips: Vec<Trip>,
}

impl Shuttle {
    pub fn short(&self) -> String {
        let mut lines = vec![format!(
            "Shuttle {} ({} trips)",
            self.shuttle_name,
            self.trips.len()
        )];
        for trip in &self.trips {
            lines.push(format!("  {}", trip.short()));
        }
        lines.join("\n")
    }
}
