//! Recurrence rules for chaining definitions
//!
//! A chaining is one-time when its frequency value is zero/absent or its
//! unit is empty/absent. Otherwise it repeats every `value × unit`.
//! Unit names are matched case-insensitively and unknown names fall back to
//! the hour unit instead of failing.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length unit of one recurrence step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Hour,
    Day,
    Week,
}

impl FrequencyUnit {
    /// Match a stored unit name. Returns None for unrecognized names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "hour" | "hours" | "hourly" => Some(Self::Hour),
            "day" | "days" | "daily" => Some(Self::Day),
            "week" | "weeks" | "weekly" => Some(Self::Week),
            _ => None,
        }
    }

    /// Hours in one unit
    pub fn hours(self) -> i64 {
        match self {
            Self::Hour => 1,
            Self::Day => 24,
            Self::Week => 7 * 24,
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hour => write!(f, "hour"),
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
        }
    }
}

/// Resolved recurrence of a chaining definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    /// Single occurrence starting at the anchor, never closing
    OneTime,
    /// Fixed-length cycles starting at the anchor
    Periodic {
        value: u32,
        unit: FrequencyUnit,
        /// Raw unit text when it was not recognized and hour was assumed
        unrecognized_unit: Option<String>,
    },
}

impl Recurrence {
    /// Build from the stored frequency fields.
    ///
    /// An absent value is treated as 0.
    pub fn from_parts(value: Option<u32>, unit: Option<&str>) -> Self {
        let value = value.unwrap_or(0);
        let unit = unit.unwrap_or("");

        if value == 0 || unit.is_empty() {
            return Self::OneTime;
        }

        match FrequencyUnit::parse(unit) {
            Some(parsed) => Self::Periodic {
                value,
                unit: parsed,
                unrecognized_unit: None,
            },
            None => Self::Periodic {
                value,
                unit: FrequencyUnit::Hour,
                unrecognized_unit: Some(unit.to_string()),
            },
        }
    }

    /// Cycle length for periodic rules, None for one-time
    pub fn cycle_length(&self) -> Option<TimeDelta> {
        match self {
            Self::OneTime => None,
            Self::Periodic { value, unit, .. } => {
                Some(TimeDelta::hours(i64::from(*value) * unit.hours()))
            }
        }
    }

    pub fn is_one_time(&self) -> bool {
        matches!(self, Self::OneTime)
    }

    /// Unit text that triggered the hour fallback, if any
    pub fn unit_fallback(&self) -> Option<&str> {
        match self {
            Self::Periodic {
                unrecognized_unit: Some(raw),
                ..
            } => Some(raw.as_str()),
            _ => None,
        }
    }
}
