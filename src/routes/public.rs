use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: liveness, the two account operations and the
/// read-only catalog listings.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/users/authenticate
        // Credentials in, identity plus signed token out. 400 on any credential mismatch.
        .route("/api/users/authenticate", post(handlers::authenticate))
        // POST /api/users/register
        // Creates an account with the default role. No token is issued.
        .route("/api/users/register", post(handlers::register))
        // GET /api/nationalparks
        .route("/api/nationalparks", get(handlers::get_national_parks))
        // GET /api/trails
        .route("/api/trails", get(handlers::get_trails))
        // GET /api/trails/in-park/{national_park_id}
        .route(
            "/api/trails/in-park/{national_park_id}",
            get(handlers::get_trails_in_national_park),
        )
}
