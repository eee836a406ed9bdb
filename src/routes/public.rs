use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Public Router Module
///
/// Mounted under `/api/public`. These handlers never see `IdentityClaims`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /api/public/register
        // Creates a participant account (role "user") and returns a token for it.
        .route("/register", post(handlers::register))
        // POST /api/public/login
        // Exchanges username-or-email plus password for a token.
        .route("/login", post(handlers::login))
        // POST /api/public/validate
        // Answers whether `{"token": ...}` is a currently valid token.
        .route("/validate", post(handlers::validate))
}
