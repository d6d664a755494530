pub mod admin;
pub mod auth;
pub mod fires;
pub mod health;
pub mod regions;
pub mod summary;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                          login (public)
/// /auth/logout                         logout (requires auth)
///
/// /fires                               list, create
/// /fires/{id}                          get, update, delete
///
/// /summary                             per-region totals
///
/// /regions                             regions the caller may file in
/// /regions/mapping                     region -> locations
/// /regions/{region}/locations          locations of one region
///
/// /admin/users                         list, create (admin only)
/// /admin/users/{id}                    delete (admin only)
/// /admin/audit-logs                    query (admin only)
/// /admin/audit-logs/export             CSV download (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/fires", fires::router())
        .nest("/summary", summary::router())
        .nest("/regions", regions::router())
        .nest("/admin", admin::router())
}
