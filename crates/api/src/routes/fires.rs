//! Route definitions for the `/fires` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::fires;
use crate::state::AppState;

/// Routes mounted at `/fires`.
///
/// ```text
/// GET    /        -> list_fires (?start_date, ?end_date)
/// POST   /        -> create_fire
/// GET    /{id}    -> get_fire
/// PUT    /{id}    -> update_fire
/// DELETE /{id}    -> delete_fire
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(fires::list_fires).post(fires::create_fire))
        .route(
            "/{id}",
            get(fires::get_fire)
                .put(fires::update_fire)
                .delete(fires::delete_fire),
        )
}
