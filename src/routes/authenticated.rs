use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here relies on the authentication layer applied in `create_router`;
/// a request without a valid, unexpired token never reaches them (401).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/nationalparks/{id}
        .route("/api/nationalparks/{id}", get(handlers::get_national_park))
}
