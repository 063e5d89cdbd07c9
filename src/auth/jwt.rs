//! JWT handling for dashboard and device users
//!
//! Tokens are HS256 with a `scope` claim distinguishing access tokens from
//! refresh tokens. Only access tokens authorize API calls.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::AssuranceError;

/// Scope value carried by access tokens
pub const ACCESS_SCOPE: &str = "access";
/// Scope value carried by refresh tokens
pub const REFRESH_SCOPE: &str = "refresh";

/// Payload stored in JWT token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company_id: String,
    pub scope: String,
    pub iat: u64,
    pub exp: u64,
}

/// Input for creating an access token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub company_id: String,
}

/// Signed access/refresh pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

fn unix_now() -> Result<u64, AssuranceError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AssuranceError::Auth(format!("System time error: {}", e)))
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, AssuranceError> {
        if secret.is_empty() {
            return Err(AssuranceError::Config(
                "JWT_SECRET is required outside dev mode".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(AssuranceError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Validator for dev mode with a fixed secret
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 3600,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, AssuranceError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AssuranceError::Auth(format!("Failed to sign token: {}", e)))
    }

    /// Generate an access token
    pub fn generate_token(&self, input: TokenInput) -> Result<String, AssuranceError> {
        let now = unix_now()?;
        self.sign(&Claims {
            sub: input.user_id,
            username: input.username,
            email: input.email,
            role: input.role,
            company_id: input.company_id,
            scope: ACCESS_SCOPE.into(),
            iat: now,
            exp: now + self.expiry_seconds,
        })
    }

    /// Generate a refresh token (7 days) carrying only the user id
    pub fn generate_refresh_token(&self, user_id: &str) -> Result<String, AssuranceError> {
        let now = unix_now()?;
        let refresh_expiry = 7 * 24 * 60 * 60;

        self.sign(&Claims {
            sub: user_id.to_string(),
            username: String::new(),
            email: String::new(),
            role: String::new(),
            company_id: String::new(),
            scope: REFRESH_SCOPE.into(),
            iat: now,
            exp: now + refresh_expiry,
        })
    }

    pub fn generate_pair(&self, input: TokenInput) -> Result<TokenPair, AssuranceError> {
        let refresh_token = self.generate_refresh_token(&input.user_id)?;
        let access_token = self.generate_token(input)?;
        let expires_at = unix_now()? + self.expiry_seconds;
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Verify and decode a token of any scope
    pub fn verify_token(&self, token: &str) -> Result<Claims, AssuranceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let msg = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Invalid token",
            };
            AssuranceError::Unauthorized(msg.into())
        })
    }

    /// Verify a token and require the access scope
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AssuranceError> {
        let claims = self.verify_token(token)?;
        if claims.scope != ACCESS_SCOPE {
            return Err(AssuranceError::Unauthorized("Invalid token scope".into()));
        }
        Ok(claims)
    }
}

/// Extract token from an Authorization header in "Bearer <token>" form
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    auth_header?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
