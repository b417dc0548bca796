use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod token;

// Routing segregated by access tier (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

use auth::{ADMIN_ROLE, authorize_request};

// --- Public Re-exports ---

pub use accounts::Authenticator;
pub use auth::{AuthUser, AuthorizationGate, GateRejection, KeysState};
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{ParkRepositoryState, TrailRepositoryState, UserStoreState};
pub use token::{TokenIssuer, TokenKeys};

/// AppState
///
/// The single, cloneable container of everything a request may touch. All fields are
/// immutable after startup; the repositories hold the connection pool.
#[derive(Clone)]
pub struct AppState {
    pub parks: ParkRepositoryState,
    pub trails: TrailRepositoryState,
    pub accounts: Authenticator,
    /// Signing/verification key, shared by the issuer (inside `accounts`) and the gate.
    pub keys: KeysState,
}

impl AppState {
    /// Wires the issuer and the authenticator around one shared key.
    pub fn new(
        parks: ParkRepositoryState,
        trails: TrailRepositoryState,
        users: UserStoreState,
        keys: KeysState,
    ) -> Self {
        let accounts = Authenticator::new(users, TokenIssuer::new(keys.clone()));
        Self {
            parks,
            trails,
            accounts,
            keys,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for KeysState {
    fn from_ref(app_state: &AppState) -> KeysState {
        app_state.keys.clone()
    }
}

/// auth_middleware
///
/// Runs the authorization gate for every route it layers. If the `AuthUser` extractor
/// rejects, the handler never executes (401). On success the resolved identity is
/// attached to the request extensions for downstream extractors.
async fn auth_middleware(user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// admin_middleware
///
/// The gate with the "Admin" role required. Runs before any handler extractor, so a
/// valid token with another role is answered with 403 whatever the request body holds.
async fn admin_middleware(
    State(keys): State<KeysState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authorize_request(keys, request.headers(), &[ADMIN_ROLE])?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing structure, applies the gate layers to the protected tiers
/// and wraps everything in request-id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        .with_state(state);

    base_router.layer(
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
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of a request carries its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
