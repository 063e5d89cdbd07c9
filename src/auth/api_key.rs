//! Shared API key check
//!
//! Every `/api/*` request must carry the configured key in `X-API-KEY`.
//! When no key is configured the check is disabled.

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Debug, Clone)]
pub struct ApiKeyValidator {
    key: Option<String>,
}

impl ApiKeyValidator {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.filter(|k| !k.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Whether the supplied header value is accepted
    pub fn validate(&self, api_key: Option<&str>) -> bool {
        match (&self.key, api_key) {
            (None, _) => true,
            (Some(expected), Some(given)) => constant_time_compare(given, expected),
            (Some(_), None) => false,
        }
    }
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
