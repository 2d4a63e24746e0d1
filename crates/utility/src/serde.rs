//! Schema annotations for plain-`String` wire fields that carry a specific
//! format (`HH:MM` pickup times). Mirrors the `duration` module's approach:
//! the wire value stays a plain string, this only attaches a `format` hint
//! for generated JSON Schemas.

pub mod hhmm {
    use schemars::gen::SchemaGenerator;
    use schemars::schema::{InstanceType, Schema, SchemaObject};

    pub fn schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            format: Some("HH:MM".to_owned()),
            ..Default::default()
        }
        .into()
    }

    /// Parses an `HH:MM` string into `(hour, minute)`. Used by C3's time
    /// resolution, not by serde itself.
    pub fn parse(value: &str) -> Option<(u32, u32)> {
        let (h, m) = value.split_once(':')?;
        Some((h.parse().ok()?, m.parse().ok()?))
    }
}
