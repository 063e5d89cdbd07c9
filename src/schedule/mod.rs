//! Chaining schedule evaluation
//!
//! - `frequency`: recurrence rules
//! - `window`: occurrence window math
//! - `timezone`: caller timezone resolution
//! - `completion`: per-item completion checks
//! - `resolver`: outstanding work per device and user

pub mod completion;
pub mod frequency;
pub mod resolver;
pub mod timezone;
pub mod window;

pub use completion::{CompletionChecker, CompletionStatus};
pub use frequency::{FrequencyUnit, Recurrence};
pub use resolver::{ActiveChaining, ChainingResolver, Outcome, OutstandingItem};
pub use timezone::{resolve_timezone, ResolvedTimezone, TIMEZONE_HEADER};
pub use window::{current_window, open_end, OccurrenceWindow};
