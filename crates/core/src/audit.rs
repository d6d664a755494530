//! Audit trail: append-only records of who changed what.
//!
//! [`AuditTrail`] validates an entry, hands it to an [`AuditSink`] and retries
//! transient sink failures with a fixed delay. The sink stamps the entry with
//! its id and UTC timestamp at write time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::incident::FireReport;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Action and entity constants
// ---------------------------------------------------------------------------

/// Known action labels for audit entries.
pub mod actions {
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const LOGIN_FAILED: &str = "login_failed";
}

/// Entity type names written to the `table_name` column.
pub mod entities {
    pub const FIRE: &str = "Fire";
    pub const USER: &str = "User";
}

/// Fields never reported in change descriptions.
pub const IGNORED_DIFF_FIELDS: &[&str] = &["id"];

/// Default number of write attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between write attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// An audit entry before it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAuditEntry {
    pub username: String,
    pub action: String,
    pub entity_type: String,
    pub record_id: Option<DbId>,
    pub changes: Option<String>,
}

impl NewAuditEntry {
    pub fn new(
        username: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            record_id: None,
            changes: None,
        }
    }

    pub fn record(mut self, id: DbId) -> Self {
        self.record_id = Some(id);
        self
    }

    pub fn changes(mut self, description: impl Into<String>) -> Self {
        self.changes = Some(description.into());
        self
    }

    /// Structural checks; the record id may be absent only for failed logins.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.username.trim().is_empty() {
            return Err(AuditError::Invalid("username must not be empty".into()));
        }
        if self.action.trim().is_empty() {
            return Err(AuditError::Invalid("action must not be empty".into()));
        }
        if self.entity_type.trim().is_empty() {
            return Err(AuditError::Invalid("entity type must not be empty".into()));
        }
        match self.record_id {
            Some(id) if id < 0 => Err(AuditError::Invalid(format!(
                "record id must be non-negative, got {id}"
            ))),
            None if self.action != actions::LOGIN_FAILED => Err(AuditError::Invalid(format!(
                "record id is required for '{}' entries",
                self.action
            ))),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A single failed write reported by a sink.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct AuditSinkError(pub String);

impl AuditSinkError {
    pub fn new(msg: impl fmt::Display) -> Self {
        Self(msg.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Invalid audit entry: {0}")]
    Invalid(String),

    #[error("Audit write failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl From<AuditError> for CoreError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Invalid(msg) => CoreError::Validation(msg),
            other => CoreError::Internal(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Storage backend for audit entries. Append-only.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one entry and return its id.
    async fn append(&self, entry: &NewAuditEntry) -> Result<DbId, AuditSinkError>;
}

/// An entry as kept by [`MemoryAuditSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAuditEntry {
    pub id: DbId,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub entry: NewAuditEntry,
}

/// In-process sink for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<StoredAuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries newest first.
    pub async fn entries(&self) -> Vec<StoredAuditEntry> {
        let mut entries = self.entries.lock().await.clone();
        entries.reverse();
        entries
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, entry: &NewAuditEntry) -> Result<DbId, AuditSinkError> {
        let mut entries = self.entries.lock().await;
        let id = entries.len() as DbId + 1;
        entries.push(StoredAuditEntry {
            id,
            timestamp: Utc::now(),
            entry: entry.clone(),
        });
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Trail
// ---------------------------------------------------------------------------

/// Fixed-delay retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Writes audit entries through a sink with retry.
#[derive(Clone)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
    retry: RetryPolicy,
}

impl fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditTrail")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl AuditTrail {
    pub fn new(sink: Arc<dyn AuditSink>, retry: RetryPolicy) -> Self {
        Self { sink, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Write `entry`, retrying failed attempts after a fixed delay.
    ///
    /// Returns the new entry id, or [`AuditError::Exhausted`] once every
    /// attempt has failed.
    pub async fn record(&self, entry: NewAuditEntry) -> Result<DbId, AuditError> {
        entry.validate()?;

        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.sink.append(&entry).await {
                Ok(id) => {
                    tracing::debug!(
                        audit_id = id,
                        action = %entry.action,
                        entity_type = %entry.entity_type,
                        "Audit entry written"
                    );
                    return Ok(id);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        action = %entry.action,
                        error = %e,
                        "Audit write attempt failed"
                    );
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        tracing::error!(
            action = %entry.action,
            entity_type = %entry.entity_type,
            record_id = ?entry.record_id,
            error = %last_error,
            "Audit write failed after all retries"
        );
        Err(AuditError::Exhausted {
            attempts,
            last_error,
        })
    }

    /// Positional form of [`AuditTrail::record`].
    pub async fn record_event(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        record_id: Option<DbId>,
        description: Option<String>,
    ) -> Result<DbId, AuditError> {
        self.record(NewAuditEntry {
            username: actor.to_string(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            record_id,
            changes: description,
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Change descriptions
// ---------------------------------------------------------------------------

/// One changed field, rendered as `field: old -> new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.old, self.new)
    }
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "none".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten nested objects into dotted paths.
fn flatten_into(
    prefix: &str,
    value: &serde_json::Value,
    out: &mut Vec<(String, serde_json::Value)>,
) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, val, out);
            }
        }
        other => out.push((prefix.to_string(), other.clone())),
    }
}

/// Compare two serializable values field by field.
///
/// Top-level keys in [`IGNORED_DIFF_FIELDS`] are skipped. Fields present on
/// only one side are compared against `none`.
pub fn diff_fields<T: Serialize>(old: &T, new: &T) -> Result<Vec<FieldChange>, CoreError> {
    let to_flat = |v: &T| -> Result<Vec<(String, serde_json::Value)>, CoreError> {
        let json = serde_json::to_value(v)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize for diff: {e}")))?;
        let mut flat = Vec::new();
        flatten_into("", &json, &mut flat);
        Ok(flat)
    };

    let old_flat = to_flat(old)?;
    let new_flat = to_flat(new)?;
    let null = serde_json::Value::Null;

    let mut changes = Vec::new();
    for (field, new_val) in &new_flat {
        let top = field.split('.').next().unwrap_or(field);
        if IGNORED_DIFF_FIELDS.contains(&top) {
            continue;
        }
        let old_val = old_flat
            .iter()
            .find(|(f, _)| f == field)
            .map_or(&null, |(_, v)| v);
        if old_val != new_val {
            changes.push(FieldChange {
                field: field.clone(),
                old: render_value(old_val),
                new: render_value(new_val),
            });
        }
    }
    for (field, old_val) in &old_flat {
        let top = field.split('.').next().unwrap_or(field);
        if IGNORED_DIFF_FIELDS.contains(&top) || new_flat.iter().any(|(f, _)| f == field) {
            continue;
        }
        changes.push(FieldChange {
            field: field.clone(),
            old: render_value(old_val),
            new: render_value(&null),
        });
    }
    Ok(changes)
}

/// Join changes with `"; "`. `None` when nothing changed.
pub fn render_changes(changes: &[FieldChange]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }
    Some(
        changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// One-line description of a report, used for create and delete entries.
pub fn describe_report(report: &FireReport) -> String {
    format!(
        "date: {}; region: {}; location: {}",
        report.date, report.region, report.location
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;

    use super::*;
    use crate::incident::tests::report;
    use crate::incident::FireIncident;

    /// Fails the first `failures` appends, then delegates to memory.
    struct FlakySink {
        failures: u32,
        calls: AtomicU32,
        inner: MemoryAuditSink,
    }

    impl FlakySink {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                inner: MemoryAuditSink::new(),
            }
        }
    }

    #[async_trait]
    impl AuditSink for FlakySink {
        async fn append(&self, entry: &NewAuditEntry) -> Result<DbId, AuditSinkError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(AuditSinkError::new(format!("connection reset ({call})")));
            }
            self.inner.append(entry).await
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    fn delete_entry() -> NewAuditEntry {
        NewAuditEntry::new("admin", actions::DELETE, entities::FIRE).record(5)
    }

    // -----------------------------------------------------------------------
    // Retry
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let sink = Arc::new(FlakySink::new(2));
        let trail = AuditTrail::new(sink.clone(), fast_retry());

        let id = trail.record(delete_entry()).await.unwrap();

        assert_eq!(id, 1);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.inner.len().await, 1);
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let sink = Arc::new(FlakySink::new(u32::MAX));
        let trail = AuditTrail::new(sink.clone(), fast_retry());

        let err = trail.record(delete_entry()).await.unwrap_err();

        assert_matches!(err, AuditError::Exhausted { attempts: 3, ref last_error } if last_error.contains("(3)"));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
        assert!(sink.inner.is_empty().await);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let sink = Arc::new(FlakySink::new(0));
        let trail = AuditTrail::new(
            sink.clone(),
            RetryPolicy {
                max_attempts: 0,
                delay: Duration::ZERO,
            },
        );
        trail.record(delete_entry()).await.unwrap();
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_entry_is_not_written() {
        let sink = Arc::new(FlakySink::new(0));
        let trail = AuditTrail::new(sink.clone(), fast_retry());

        let err = trail
            .record_event("admin", actions::UPDATE, entities::FIRE, Some(-1), None)
            .await
            .unwrap_err();

        assert_matches!(err, AuditError::Invalid(_));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn entries_are_append_only() {
        let sink = Arc::new(MemoryAuditSink::new());
        let trail = AuditTrail::new(sink.clone(), fast_retry());

        trail
            .record(NewAuditEntry::new("a", actions::CREATE, entities::FIRE).record(1))
            .await
            .unwrap();
        let before = sink.entries().await;

        for id in 2..=4 {
            trail
                .record(NewAuditEntry::new("a", actions::CREATE, entities::FIRE).record(id))
                .await
                .unwrap();
        }

        let after = sink.entries().await;
        assert_eq!(after.len(), before.len() + 3);
        assert_eq!(after.last(), before.last());
        assert_eq!(after[0].entry.record_id, Some(4));
    }

    // -----------------------------------------------------------------------
    // Entry validation
    // -----------------------------------------------------------------------

    #[test]
    fn missing_record_id_only_allowed_for_failed_login() {
        assert!(NewAuditEntry::new("ghost", actions::LOGIN_FAILED, entities::USER)
            .validate()
            .is_ok());
        assert!(NewAuditEntry::new("admin", actions::DELETE, entities::FIRE)
            .validate()
            .is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(NewAuditEntry::new(" ", actions::LOGIN, entities::USER)
            .record(1)
            .validate()
            .is_err());
        assert!(NewAuditEntry::new("a", "", entities::USER)
            .record(1)
            .validate()
            .is_err());
        assert!(NewAuditEntry::new("a", actions::LOGIN, "")
            .record(1)
            .validate()
            .is_err());
    }

    #[test]
    fn audit_errors_convert_to_core_errors() {
        assert_matches!(
            CoreError::from(AuditError::Invalid("x".into())),
            CoreError::Validation(_)
        );
        assert_matches!(
            CoreError::from(AuditError::Exhausted {
                attempts: 3,
                last_error: "down".into()
            }),
            CoreError::Internal(_)
        );
    }

    // -----------------------------------------------------------------------
    // Change descriptions
    // -----------------------------------------------------------------------

    #[test]
    fn diff_reports_changed_fields_only() {
        let old = report("A", "loc");
        let mut new = old.clone();
        new.damage_area = Some(4.5);
        new.responders.forest_protection.people = Some(3);

        let changes = diff_fields(&old, &new).unwrap();
        let rendered = render_changes(&changes).unwrap();

        assert_eq!(changes.len(), 2);
        assert!(rendered.contains("damage_area: none -> 4.5"));
        assert!(rendered.contains("responders.forest_protection.people: none -> 3"));
        assert!(rendered.contains("; "));
    }

    #[test]
    fn diff_skips_id() {
        let old = FireIncident {
            id: 1,
            report: report("A", "loc"),
        };
        let mut new = old.clone();
        new.id = 2;
        new.report.location = "other".into();

        let changes = diff_fields(&old, &new).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].to_string(), "location: loc -> other");
    }

    #[test]
    fn identical_values_render_nothing() {
        let r = report("A", "loc");
        let changes = diff_fields(&r, &r.clone()).unwrap();
        assert!(changes.is_empty());
        assert_eq!(render_changes(&changes), None);
    }

    #[test]
    fn describe_report_names_location() {
        let r = report("A", "loc");
        assert_eq!(describe_report(&r), "date: 2024-07-01; region: A; location: loc");
    }
}
