use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mobility_assistance::MobilityAssistance;

/// A fleet member: stable id, display name, the (non-empty) set of
/// assistance types it can carry, and an optional license plate.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    pub mobility_assistance: Vec<MobilityAssistance>,
    pub license_plate: Option<String>,
    /// Seat capacity; modeled but not enforced by either scheduler (see
    /// DESIGN.md OQ-3).
    pub capacity: Option<i32>,
}

impl Vehicle {
    pub fn compatible(&self, needed: MobilityAssistance) -> bool {
        self.mobility_assistance
            .iter()
            .any(|capability| capability.compatible(needed))
    }
}
