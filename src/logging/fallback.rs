//! Fallback tracking for permissive input handling
//!
//! Unknown timezones resolve to UTC and unknown frequency units resolve to
//! hour-length cycles. Both keep the request alive, so every occurrence is
//! logged on the `assurance::fallback` target and counted here for `/status`.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Which permissive fallback fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// Unparseable timezone name, UTC used instead
    Timezone,
    /// Unrecognized frequency unit, hour used instead
    FrequencyUnit,
}

impl fmt::Display for FallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackKind::Timezone => write!(f, "timezone"),
            FallbackKind::FrequencyUnit => write!(f, "frequency_unit"),
        }
    }
}

/// Counters for fallback occurrences since process start
#[derive(Debug, Default)]
pub struct FallbackMetrics {
    timezone: AtomicU64,
    frequency_unit: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FallbackSnapshot {
    pub timezone: u64,
    pub frequency_unit: u64,
}

impl FallbackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fallback, emitting a warn event with the offending value
    pub fn record(&self, kind: FallbackKind, raw_value: &str) {
        let counter = match kind {
            FallbackKind::Timezone => &self.timezone,
            FallbackKind::FrequencyUnit => &self.frequency_unit,
        };
        let total = counter.fetch_add(1, Ordering::Relaxed) + 1;

        warn!(
            target: "assurance::fallback",
            kind = %kind,
            value = raw_value,
            total,
            "Permissive fallback applied"
        );
    }

    pub fn snapshot(&self) -> FallbackSnapshot {
        FallbackSnapshot {
            timezone: self.timezone.load(Ordering::Relaxed),
            frequency_unit: self.frequency_unit.load(Ordering::Relaxed),
        }
    }
}
