use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::vehicle::Vehicle;

/// A named fleet; unique name across the store; mutation bumps `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    pub vehicles: Vec<Vehicle>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating/updating a program; the store assigns `id`,
/// `created_at`, `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInput {
    pub name: String,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}
