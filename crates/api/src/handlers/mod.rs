pub mod audit;
pub mod auth;
pub mod fires;
pub mod regions;
pub mod summary;
pub mod users;

use firewatch_core::audit::{AuditError, NewAuditEntry};

use crate::state::AppState;

/// Write an audit entry after the primary change has committed.
///
/// Failures never fail the request. Exhausted retries are already logged by
/// the trail; rejected entries are logged here.
pub(crate) async fn record_audit(state: &AppState, entry: NewAuditEntry) {
    if let Err(AuditError::Invalid(reason)) = state.audit.record(entry).await {
        tracing::error!(%reason, "Audit entry rejected");
    }
}
