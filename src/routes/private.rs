use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Private Router Module
///
/// Mounted under `/api/private` behind the auth gate, so every handler here may take
/// `IdentityClaims`. Collection paths keep their trailing slash: the elevated route
/// table matches `/api/private/users/` literally.
pub fn private_routes() -> Router<AppState> {
    Router::new()
        // --- Users ---
        // GET/POST/DELETE /users/
        // Listing, creation and batch deletion. Admin only (see the elevated route table).
        .route(
            "/users/",
            get(handlers::list_users)
                .post(handlers::create_user)
                .delete(handlers::batch_delete_users),
        )
        // GET/PUT/DELETE /users/{id}
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // --- Notifications ---
        .route(
            "/notifications/",
            get(handlers::list_notifications)
                .post(handlers::create_notification)
                .delete(handlers::batch_delete_notifications),
        )
        .route(
            "/notifications/{id}",
            get(handlers::get_notification)
                .put(handlers::update_notification)
                .delete(handlers::delete_notification),
        )
        // Explicit fallback so the gate layer also wraps unknown private paths.
        .fallback(handlers::not_found)
}
