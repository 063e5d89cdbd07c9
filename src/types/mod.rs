//! Shared types

pub mod error;

pub use error::{AssuranceError, Result};
