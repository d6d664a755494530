//! Handlers for the audit log endpoints. Admin only.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use firewatch_core::access::Action;
use firewatch_core::types::{DbId, Timestamp};
use firewatch_db::models::audit::{AuditLog, AuditLogPage, AuditQuery};
use firewatch_db::repositories::AuditLogRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Column headers of the CSV export, in order.
pub const CSV_HEADER: [&str; 6] = [
    "Timestamp",
    "Username",
    "Action",
    "TableName",
    "RecordId",
    "Changes",
];

/// File name offered to the browser for the CSV export.
pub const CSV_FILE_NAME: &str = "audit_logs.csv";

/// Query parameters for `GET /admin/audit-logs`.
#[derive(Debug, Deserialize)]
pub struct AuditLogQueryParams {
    pub username: Option<String>,
    pub action: Option<String>,
    pub table_name: Option<String>,
    pub record_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<AuditLogQueryParams> for AuditQuery {
    fn from(params: AuditLogQueryParams) -> Self {
        AuditQuery {
            username: params.username,
            action: params.action,
            table_name: params.table_name,
            record_id: params.record_id,
            from: params.from,
            to: params.to,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// GET /api/v1/admin/audit-logs
///
/// Filtered, paginated audit entries, newest first.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(params): Query<AuditLogQueryParams>,
) -> AppResult<Json<DataResponse<AuditLogPage>>> {
    admin.authorize(&state, Action::ViewAudit, &[])?;
    let query = AuditQuery::from(params);

    let items = AuditLogRepo::query(&state.pool, &query).await?;
    let total = AuditLogRepo::count(&state.pool, &query).await?;

    Ok(Json(DataResponse {
        data: AuditLogPage { items, total },
    }))
}

/// GET /api/v1/admin/audit-logs/export
///
/// Every entry as a CSV download, newest first.
pub async fn export_audit_logs(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<impl IntoResponse> {
    admin.authorize(&state, Action::ExportAudit, &[])?;

    let logs = AuditLogRepo::export_all(&state.pool).await?;
    let body = render_csv(&logs)
        .map_err(|e| AppError::InternalError(format!("CSV export error: {e}")))?;

    tracing::info!(
        user_id = admin.principal.user_id,
        rows = logs.len(),
        "Audit log exported"
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILE_NAME}\""),
            ),
        ],
        body,
    ))
}

/// Render audit entries as UTF-8 CSV with RFC 3339 timestamps.
///
/// Rows are written in the order given.
pub fn render_csv(logs: &[AuditLog]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for log in logs {
        let record_id = log.record_id.map(|id| id.to_string()).unwrap_or_default();
        writer.write_record([
            log.timestamp.to_rfc3339().as_str(),
            log.username.as_str(),
            log.action.as_str(),
            log.table_name.as_str(),
            record_id.as_str(),
            log.changes.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
