//! Occurrence window calculation
//!
//! All arithmetic happens on instants in the caller's timezone. Adding a
//! `TimeDelta` moves the absolute instant, so DST transitions never shift a
//! cycle boundary.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::schedule::frequency::Recurrence;

/// Wall-clock end used for one-time chainings
const OPEN_END: (i32, u32, u32, u32, u32, u32) = (9999, 12, 31, 23, 59, 59);

/// Half-open window `[start, end)` of one chaining occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceWindow<Z: TimeZone> {
    pub start: DateTime<Z>,
    pub end: DateTime<Z>,
}

impl<Z: TimeZone> OccurrenceWindow<Z> {
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    /// Whether `instant` falls inside `[start, end)`
    pub fn contains<Z2: TimeZone>(&self, instant: &DateTime<Z2>) -> bool {
        let t = instant.with_timezone(&Utc);
        self.start_utc() <= t && t < self.end_utc()
    }

    pub fn duration(&self) -> TimeDelta {
        self.end_utc() - self.start_utc()
    }
}

/// The open-ended sentinel (9999-12-31 23:59:59 local) in `tz`
pub fn open_end<Z: TimeZone>(tz: &Z) -> DateTime<Z> {
    let (y, mo, d, h, mi, s) = OPEN_END;
    tz.with_ymd_and_hms(y, mo, d, h, mi, s)
        .earliest()
        .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.with_timezone(tz))
}

/// Compute the occurrence window active at `now`.
///
/// One-time rules return `[anchor, open_end)`. Periodic rules return the
/// cycle containing `now`, or the first cycle when `now` precedes the
/// anchor.
pub fn current_window<Z: TimeZone>(
    anchor: &DateTime<Z>,
    recurrence: &Recurrence,
    now: &DateTime<Z>,
) -> OccurrenceWindow<Z> {
    let tz = anchor.timezone();

    let cycle = match recurrence.cycle_length() {
        Some(cycle) if cycle > TimeDelta::zero() => cycle,
        _ => {
            return OccurrenceWindow {
                start: anchor.clone(),
                end: open_end(&tz),
            }
        }
    };

    let start = current_cycle_start(anchor, cycle, now);
    let end = start
        .clone()
        .checked_add_signed(cycle)
        .unwrap_or_else(|| open_end(&tz));

    OccurrenceWindow { start, end }
}

/// `anchor + floor((now - anchor) / cycle) × cycle`, or the anchor itself
/// when `now` is before it.
fn current_cycle_start<Z: TimeZone>(
    anchor: &DateTime<Z>,
    cycle: TimeDelta,
    now: &DateTime<Z>,
) -> DateTime<Z> {
    let elapsed = now.clone() - anchor.clone();
    if elapsed < TimeDelta::zero() {
        return anchor.clone();
    }

    let cycle_ms = cycle.num_milliseconds();
    let cycles = elapsed.num_milliseconds() / cycle_ms;

    anchor
        .clone()
        .checked_add_signed(TimeDelta::milliseconds(cycles * cycle_ms))
        .unwrap_or_else(|| anchor.clone())
}
