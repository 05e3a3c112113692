//! Fixed urgency enum shared by `pain_point_deepening` and `lead_qualification`.
//!
//! Urgency is always this enum at the stage boundary, never a free string or
//! a derived float.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How urgently a lead's pain points warrant outreach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    /// Weight used by the ROI-potential formula.
    pub fn roi_weight(&self) -> f64 {
        match self {
            UrgencyLevel::Low => 0.1,
            UrgencyLevel::Medium => 0.2,
            UrgencyLevel::High => 0.3,
            UrgencyLevel::Critical => 0.4,
        }
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        UrgencyLevel::Medium
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
            UrgencyLevel::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for UrgencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(UrgencyLevel::Low),
            "medium" => Ok(UrgencyLevel::Medium),
            "high" => Ok(UrgencyLevel::High),
            "critical" => Ok(UrgencyLevel::Critical),
            other => Err(format!("unrecognized urgency level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for level in [
            UrgencyLevel::Low,
            UrgencyLevel::Medium,
            UrgencyLevel::High,
            UrgencyLevel::Critical,
        ] {
            let parsed: UrgencyLevel = level.to_string().parse().unwrap();
            assert_eq!(parsed, level);
        }
    }

    #[test]
    fn weights_are_monotonically_increasing() {
        assert!(UrgencyLevel::Low.roi_weight() < UrgencyLevel::Medium.roi_weight());
        assert!(UrgencyLevel::Medium.roi_weight() < UrgencyLevel::High.roi_weight());
        assert!(UrgencyLevel::High.roi_weight() < UrgencyLevel::Critical.roi_weight());
    }
}
