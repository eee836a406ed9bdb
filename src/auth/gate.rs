use axum::{
    body::{Body, to_bytes},
    extract::{OriginalUri, Request, State},
    http::{Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{
    IdentityClaims, RoutePermissions, TokenService,
    credentials::{extract_token, needs_body, parse_body},
};
use crate::error::AuthError;

/// Largest body the gate will buffer while looking for a `token` field.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// AuthGate
///
/// Runs extraction, verification and the permission check for every private request.
/// Holds only read-only state, so a single instance is cloned into each request.
#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenService,
    permissions: RoutePermissions,
}

impl AuthGate {
    pub fn new(tokens: TokenService, permissions: RoutePermissions) -> Self {
        Self {
            tokens,
            permissions,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// authorize
    ///
    /// On success returns the request with its [`IdentityClaims`] attached as an
    /// extension. The body is only buffered when neither the header nor the query
    /// string carried a token, and is put back untouched for the handler.
    pub async fn authorize(&self, request: Request) -> Result<Request, AuthError> {
        let (mut parts, body) = request.into_parts();
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.path().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());

        let (parsed_body, body) = if needs_body(&parts.headers, parts.uri.query()) {
            let bytes = to_bytes(body, MAX_BODY_BYTES).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not buffer request body");
                Default::default()
            });
            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok());
            (parse_body(content_type, &bytes), Body::from(bytes))
        } else {
            (None, body)
        };

        let token = extract_token(&parts.headers, parts.uri.query(), parsed_body.as_ref())
            .inspect_err(|rejection| log_rejection(&parts.method, &path, rejection))?;

        let claims = self
            .tokens
            .verify(&token)
            .map_err(AuthError::from)
            .inspect_err(|rejection| log_rejection(&parts.method, &path, rejection))?;

        self.decide(&parts.method, &path, &claims)
            .inspect_err(|rejection| log_rejection(&parts.method, &path, rejection))?;

        parts.extensions.insert(claims);
        Ok(axum::http::Request::from_parts(parts, body))
    }

    /// Applies the elevated-route table to already verified claims.
    pub fn decide(
        &self,
        method: &Method,
        path: &str,
        claims: &IdentityClaims,
    ) -> Result<(), AuthError> {
        tracing::debug!(%method, path, role = %claims.role, "checking permission");
        if self.permissions.evaluate(method, path, &claims.role) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPrivilege)
        }
    }
}

fn log_rejection(method: &Method, path: &str, rejection: &AuthError) {
    match rejection {
        AuthError::InvalidToken(reason) => {
            tracing::warn!(%method, path, reason = reason.label(), "rejected invalid token")
        }
        other => tracing::warn!(%method, path, rejection = %other, "rejected private request"),
    }
}

/// require_token
///
/// Middleware wrapping the private router. Requests either continue with verified
/// claims attached or are answered here with a 401 `{code, message}` body.
pub async fn require_token(
    State(gate): State<AuthGate>,
    request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request).await {
        Ok(request) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}
