use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Catalog mutations and the role-restricted trail read. `admin_middleware` answers 401
/// for a bad token and 403 for any role other than "Admin" before a handler runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/nationalparks
        // 409 when a park with the same (case-insensitive) name already exists.
        .route("/api/nationalparks", post(handlers::create_national_park))
        // PATCH/DELETE /api/nationalparks/{id}
        .route(
            "/api/nationalparks/{id}",
            axum::routing::patch(handlers::update_national_park)
                .delete(handlers::delete_national_park),
        )
        // POST /api/trails
        .route("/api/trails", post(handlers::create_trail))
        // GET/PATCH/DELETE /api/trails/{id}
        .route(
            "/api/trails/{id}",
            get(handlers::get_trail)
                .patch(handlers::update_trail)
                .delete(handlers::delete_trail),
        )
}
