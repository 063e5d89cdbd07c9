//! HTTP routes for the assurance service

pub mod chainings;
pub mod device;
pub mod events;
pub mod groups;
pub mod guard;
pub mod health;
pub mod response;

pub use chainings::handle_chaining_request;
pub use device::handle_device_request;
pub use events::handle_event_request;
pub use groups::handle_group_request;
pub use guard::authorize;
pub use health::{health_check, status_check};
pub use response::{not_found_response, preflight_response, FullBody};
