//! Assurance - chaining schedules for field inspections
//!
//! Companies sequence inspections and questionnaires into "chainings" that
//! recur hourly, daily or weekly (or run once) from a trigger time. Devices
//! ask which chainings the signed-in user still has work on in the current
//! occurrence window.
//!
//! ## Modules
//!
//! - **schedule**: window math, completion checks, outstanding-work resolver
//! - **store**: persistence traits and the in-memory backend
//! - **db**: MongoDB backend
//! - **routes** / **server**: hyper HTTP surface
//! - **auth**: API key, JWT, company scoping

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod schedule;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AssuranceError, Result};
