//! Repository for the append-only `audit_logs` table.

use firewatch_core::audit::NewAuditEntry;
use firewatch_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditQuery};

/// Default page size for [`AuditLogRepo::query`].
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "id, timestamp, username, action, table_name, record_id, changes";

/// Provides query and insert operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry. The timestamp is assigned by the database.
    pub async fn insert(pool: &PgPool, entry: &NewAuditEntry) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (username, action, table_name, record_id, changes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(&entry.username)
            .bind(&entry.action)
            .bind(&entry.entity_type)
            .bind(entry.record_id)
            .bind(&entry.changes)
            .fetch_one(pool)
            .await
    }

    /// Query audit logs with filtering and pagination, newest first.
    pub async fn query(pool: &PgPool, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = params
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = params.offset.unwrap_or(0).max(0);

        let (where_clause, bind_values, bind_idx) = build_audit_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs {where_clause} \
             ORDER BY timestamp DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_audit_values(sqlx::query_as::<_, AuditLog>(&query), &bind_values);
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count audit logs matching the given filter (for pagination metadata).
    pub async fn count(pool: &PgPool, params: &AuditQuery) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_audit_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM audit_logs {where_clause}");

        let q = bind_audit_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }

    /// Every entry, newest first. Feeds the CSV export.
    pub async fn export_all(pool: &PgPool) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_logs ORDER BY timestamp DESC, id DESC");
        sqlx::query_as::<_, AuditLog>(&query).fetch_all(pool).await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built audit queries.
enum BindValue {
    BigInt(DbId),
    Text(String),
    Timestamp(Timestamp),
}

/// Build a WHERE clause from the audit query filters.
///
/// Returns the clause, the values to bind in order, and the next free
/// placeholder index.
fn build_audit_filter(params: &AuditQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref username) = params.username {
        conditions.push(format!("username = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(username.clone()));
    }

    if let Some(ref action) = params.action {
        conditions.push(format!("action = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(action.clone()));
    }

    if let Some(ref table_name) = params.table_name {
        conditions.push(format!("table_name = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(table_name.clone()));
    }

    if let Some(record_id) = params.record_id {
        conditions.push(format!("record_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(record_id));
    }

    if let Some(from) = params.from {
        conditions.push(format!("timestamp >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.to {
        conditions.push(format!("timestamp <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_audit_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_audit_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
