//! Authentication and authorization for the private API.
//!
//! A private request flows through four stages:
//! credential extraction, token verification, the elevated-route permission check,
//! and finally the gate attaching verified [`IdentityClaims`] to the request.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub mod credentials;
pub mod gate;
pub mod permissions;
pub mod token;

pub use credentials::extract_token;
pub use gate::{AuthGate, require_token};
pub use permissions::{RouteDescriptor, RoutePermissions};
pub use token::TokenService;

pub const ADMIN_ROLE: &str = "admin";

/// IdentityClaims
///
/// The verified identity carried inside a token. Handlers behind the gate receive it
/// through the extractor below; it serializes as `{subjectId, role}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub subject_id: i64,
    pub role: String,
}

impl IdentityClaims {
    pub fn new(subject_id: i64, role: impl Into<String>) -> Self {
        Self {
            subject_id,
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Pulls the claims the gate attached to the request.
///
/// A handler asking for claims on a request that never passed the gate is rejected
/// rather than run without identity.
impl<S> FromRequestParts<S> for IdentityClaims
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaims>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
