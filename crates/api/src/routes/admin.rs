//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{audit, users};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /users               -> list_users
/// POST   /users               -> create_user
/// DELETE /users/{id}          -> delete_user
/// GET    /audit-logs          -> query_audit_logs
/// GET    /audit-logs/export   -> export_audit_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/audit-logs", get(audit::query_audit_logs))
        .route("/audit-logs/export", get(audit::export_audit_logs))
}
