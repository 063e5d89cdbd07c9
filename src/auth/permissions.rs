//! Roles and tenant scoping

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::jwt::Claims;
use crate::store::CompanyScope;

/// Caller role from the `role` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Sees every company
    SuperAdmin,
    /// Any other role; scoped to its own company
    Member(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "super-admin" => Role::SuperAdmin,
            other => Role::Member(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::SuperAdmin => write!(f, "super-admin"),
            Role::Member(name) => write!(f, "{}", name),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub company_id: String,
}

impl Principal {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Company restriction applied to store queries
    pub fn company_scope(&self) -> CompanyScope<'_> {
        if self.is_super_admin() {
            None
        } else {
            Some(self.company_id.as_str())
        }
    }

    /// Audit name recorded in created_by/updated_by/deleted_by
    pub fn actor(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            email: claims.email,
            role: Role::parse(&claims.role),
            company_id: claims.company_id,
        }
    }
}
