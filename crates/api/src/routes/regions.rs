//! Route definitions for the region catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::regions;
use crate::state::AppState;

/// Routes mounted at `/regions`.
///
/// ```text
/// GET /                      -> list_regions
/// GET /mapping               -> region_mapping
/// GET /{region}/locations    -> list_locations
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(regions::list_regions))
        .route("/mapping", get(regions::region_mapping))
        .route("/{region}/locations", get(regions::list_locations))
}
