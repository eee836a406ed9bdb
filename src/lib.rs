use std::time::Duration;

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
    routing::get,
};

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod password;
pub mod repository;

// Public and gated route sets.
pub mod routes;
use routes::{private, public};

// --- Public Re-exports ---

pub use auth::{AuthGate, IdentityClaims, RoutePermissions, TokenService};
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// AppState
///
/// Everything a request may need, built once at startup and cloned per request.
/// The token service and gate are derived from the configuration here, so nothing
/// downstream reads the signing secret or route table from anywhere else.
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the `Repository` trait.
    pub repo: RepositoryState,
    pub config: AppConfig,
    /// Issues tokens on login/registration and answers `/validate`.
    pub tokens: TokenService,
    /// Shares the same `TokenService` instance.
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let tokens = TokenService::new(
            config.jwt_secret.as_bytes(),
            Duration::from_secs(config.token_ttl_secs),
        );
        let gate = AuthGate::new(
            tokens.clone(),
            RoutePermissions::new(config.admin_routes.clone()),
        );

        Self {
            repo,
            config,
            tokens,
            gate,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(app_state: &AppState) -> AuthGate {
        app_state.gate.clone()
    }
}

/// create_router
///
/// Public routes live under `/api/public`, private routes under `/api/private`.
/// The gate is a full `layer` on the private router rather than a `route_layer`, so an
/// unknown private path is still authenticated before it is answered with 404.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let private_router = private::private_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_token,
    ));

    let base_router = Router::new()
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        .nest("/api/public", public::public_routes())
        .nest("/api/private", private_router)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, tagged with the `x-request-id` so all log lines of one
/// request correlate. The query string is left out of the span because it may carry
/// a token.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
