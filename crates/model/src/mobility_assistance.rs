use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A vehicle's or booking's mobility-assistance capability/need.
///
/// Ordering by `priority()` drives the greedy scheduler's allocation order:
/// `STRETCHER` (0) first, then `WHEELCHAIR` (1), then `AMBULATORY` (2) last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MobilityAssistance {
    Ambulatory,
    Wheelchair,
    Stretcher,
}

impl MobilityAssistance {
    pub fn priority(&self) -> u8 {
        match self {
            MobilityAssistance::Stretcher => 0,
            MobilityAssistance::Wheelchair => 1,
            MobilityAssistance::Ambulatory => 2,
        }
    }

    /// The short code used in shuttle names and `Shuttle.shuttle_wheelchair`.
    pub fn code(&self) -> &'static str {
        match self {
            MobilityAssistance::Stretcher => "GUR",
            MobilityAssistance::Wheelchair => "WC",
            MobilityAssistance::Ambulatory => "AMBI",
        }
    }

    /// A vehicle of assistance `self` may serve a booking of assistance
    /// `booking` iff they match, or the booking only needs `AMBULATORY`.
    pub fn compatible(&self, booking: MobilityAssistance) -> bool {
        *self == booking || booking == MobilityAssistance::Ambulatory
    }

    /// `STRETCHER`/`GUR` -> Stretcher, `WHEELCHAIR`/`WC` -> Wheelchair,
    /// anything else (including empty) -> Ambulatory.
    pub fn parse_one(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STRETCHER" | "GUR" => MobilityAssistance::Stretcher,
            "WHEELCHAIR" | "WC" => MobilityAssistance::Wheelchair,
            _ => MobilityAssistance::Ambulatory,
        }
    }

    /// Parses a list of raw tags: the first non-`AMBULATORY` value wins; if
    /// none qualify (or the list is empty), `AMBULATORY`.
    pub fn parse_list<S: AsRef<str>>(raw: &[S]) -> Self {
        raw.iter()
            .map(|s| Self::parse_one(s.as_ref()))
            .find(|a| *a != MobilityAssistance::Ambulatory)
            .unwrap_or(MobilityAssistance::Ambulatory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_idempotent() {
        for raw in ["STRETCHER", "GUR", "WHEELCHAIR", "WC", "", "whatever"] {
            let once = MobilityAssistance::parse_one(raw);
            let twice = MobilityAssistance::parse_one(once.code());
            // code() round-trips to an equivalent class, parsing it again
            // must reach a fixed point.
            assert_eq!(MobilityAssistance::parse_one(twice.code()), twice);
            let _ = once;
        }
    }

    #[test]
    fn first_non_ambulatory_wins() {
        let tags = vec!["AMBULATORY".to_string(), "WHEELCHAIR".to_string()];
        assert_eq!(
            MobilityAssistance::parse_list(&tags),
            MobilityAssistance::Wheelchair
        );
    }

    #[test]
    fn empty_list_is_ambulatory() {
        let tags: Vec<String> = vec![];
        assert_eq!(
            MobilityAssistance::parse_list(&tags),
            MobilityAssistance::Ambulatory
        );
    }

    #[test]
    fn compatibility_rule() {
        assert!(MobilityAssistance::Wheelchair.compatible(MobilityAssistance::Ambulatory));
        assert!(MobilityAssistance::Wheelchair.compatible(MobilityAssistance::Wheelchair));
        assert!(!MobilityAssistance::Wheelchair.compatible(MobilityAssistance::Stretcher));
    }
}
