//! Configuration for the assurance service
//!
//! CLI arguments and environment variable handling using clap.

use chrono_tz::Tz;
use clap::Parser;
use std::net::SocketAddr;

use crate::auth::JwtValidator;
use crate::types::AssuranceError;

/// Assurance - inspection chaining scheduler
#[derive(Parser, Debug, Clone)]
#[command(name = "assurance")]
#[command(about = "Chaining schedules and outstanding inspection work for field devices")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "assurance")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required outside dev mode)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT access token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Shared key required in X-API-KEY on every API route (optional)
    #[arg(long, env = "API_KEY")]
    pub api_key: Option<String>,

    /// Enable development mode (in-memory store fallback, dev JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Timezone used when a device sends no X-Timezone header
    #[arg(long, env = "DEFAULT_TIMEZONE", default_value = "UTC")]
    pub default_timezone: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required outside dev mode".to_string());
        }

        if self.default_timezone.parse::<Tz>().is_err() {
            return Err(format!(
                "DEFAULT_TIMEZONE '{}' is not an IANA timezone",
                self.default_timezone
            ));
        }

        Ok(())
    }

    /// Default timezone, UTC when unparseable
    pub fn default_tz(&self) -> Tz {
        self.default_timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Build the JWT validator (dev secret when unset in dev mode)
    pub fn jwt_validator(&self) -> Result<JwtValidator, AssuranceError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev()),
            (None, false) => Err(AssuranceError::Config(
                "JWT_SECRET is required outside dev mode".into(),
            )),
        }
    }
}
