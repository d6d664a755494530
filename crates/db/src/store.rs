//! PostgreSQL adapters for the core storage traits.

use async_trait::async_trait;
use firewatch_core::audit::{AuditSink, AuditSinkError, NewAuditEntry};
use firewatch_core::incident::{DateRange, FireIncident, FireReport};
use firewatch_core::store::{FireStore, StoreError};
use firewatch_core::types::DbId;
use sqlx::PgPool;

use crate::repositories::{AuditLogRepo, FireRepo};

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// [`FireStore`] backed by the `fires` table.
#[derive(Debug, Clone)]
pub struct PgFireStore {
    pool: PgPool,
}

impl PgFireStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FireStore for PgFireStore {
    async fn get_all(&self, range: DateRange) -> Result<Vec<FireIncident>, StoreError> {
        FireRepo::list(&self.pool, None, range).await.map_err(backend)
    }

    async fn get_by_region(
        &self,
        region: &str,
        range: DateRange,
    ) -> Result<Vec<FireIncident>, StoreError> {
        FireRepo::list(&self.pool, Some(region), range)
            .await
            .map_err(backend)
    }

    async fn get_by_id(&self, id: DbId) -> Result<Option<FireIncident>, StoreError> {
        FireRepo::find_by_id(&self.pool, id).await.map_err(backend)
    }

    async fn add(&self, report: &FireReport) -> Result<FireIncident, StoreError> {
        FireRepo::create(&self.pool, report).await.map_err(backend)
    }

    async fn update(&self, incident: &FireIncident) -> Result<FireIncident, StoreError> {
        FireRepo::update(&self.pool, incident)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound(incident.id))
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        FireRepo::delete(&self.pool, id).await.map_err(backend)
    }

    async fn get_all_regions(&self) -> Result<Vec<String>, StoreError> {
        FireRepo::distinct_regions(&self.pool).await.map_err(backend)
    }
}

/// [`AuditSink`] that appends to the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, entry: &NewAuditEntry) -> Result<DbId, AuditSinkError> {
        AuditLogRepo::insert(&self.pool, entry)
            .await
            .map(|log| log.id)
            .map_err(AuditSinkError::new)
    }
}
