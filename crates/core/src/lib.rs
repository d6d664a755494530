//! Firewatch domain core.
//!
//! Incident records, the region catalog, regional summaries, the access
//! policy, and the audit trail. No database dependency: storage is reached
//! through the [`store::FireStore`] and [`audit::AuditSink`] traits.

pub mod access;
pub mod audit;
pub mod error;
pub mod incident;
pub mod regions;
pub mod roles;
pub mod store;
pub mod summary;
pub mod types;
