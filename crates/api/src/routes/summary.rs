use axum::routing::get;
use axum::Router;

use crate::handlers::summary;
use crate::state::AppState;

/// Routes mounted at `/summary`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(summary::get_summary))
}
