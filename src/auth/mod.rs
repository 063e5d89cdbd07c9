//! Authentication and authorization
//!
//! Provides:
//! - Shared API key check on every API route
//! - JWT generation and validation
//! - Roles and company scoping

pub mod api_key;
pub mod jwt;
pub mod permissions;

pub use api_key::{ApiKeyValidator, API_KEY_HEADER};
pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenPair};
pub use permissions::{Principal, Role};
