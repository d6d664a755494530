//! Record store interface for fire incidents.
//!
//! Production uses the PostgreSQL implementation in `firewatch-db`;
//! [`MemoryFireStore`] backs tests and embedded use.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::incident::{DateRange, FireIncident, FireReport};
use crate::types::DbId;

/// Entity name used in not-found errors.
pub const FIRE_ENTITY: &str = "Fire";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Fire with id {0} not found")]
    NotFound(DbId),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CoreError::NotFound {
                entity: FIRE_ENTITY,
                id,
            },
            StoreError::Backend(msg) => CoreError::Internal(msg),
        }
    }
}

/// Persistence for fire incidents.
///
/// Listings are ordered by date descending, newest id first within a day.
#[async_trait]
pub trait FireStore: Send + Sync {
    async fn get_all(&self, range: DateRange) -> Result<Vec<FireIncident>, StoreError>;

    async fn get_by_region(
        &self,
        region: &str,
        range: DateRange,
    ) -> Result<Vec<FireIncident>, StoreError>;

    async fn get_by_id(&self, id: DbId) -> Result<Option<FireIncident>, StoreError>;

    /// Insert a report and return it with its new id.
    async fn add(&self, report: &FireReport) -> Result<FireIncident, StoreError>;

    /// Replace every field of an existing incident.
    async fn update(&self, incident: &FireIncident) -> Result<FireIncident, StoreError>;

    /// Remove an incident. Returns `false` if it did not exist.
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;

    /// Distinct regions that currently have at least one incident, sorted.
    async fn get_all_regions(&self) -> Result<Vec<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    next_id: DbId,
    rows: BTreeMap<DbId, FireReport>,
}

/// A [`FireStore`] kept in process memory. Ids are never reused.
#[derive(Debug, Default)]
pub struct MemoryFireStore {
    state: RwLock<MemoryState>,
}

impl MemoryFireStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list<F>(&self, keep: F) -> Vec<FireIncident>
    where
        F: Fn(&FireReport) -> bool,
    {
        let state = self.state.read().await;
        let mut out: Vec<FireIncident> = state
            .rows
            .iter()
            .filter(|(_, r)| keep(r))
            .map(|(id, r)| FireIncident {
                id: *id,
                report: r.clone(),
            })
            .collect();
        out.sort_by(|a, b| {
            b.report
                .date
                .cmp(&a.report.date)
                .then_with(|| b.id.cmp(&a.id))
        });
        out
    }
}

#[async_trait]
impl FireStore for MemoryFireStore {
    async fn get_all(&self, range: DateRange) -> Result<Vec<FireIncident>, StoreError> {
        Ok(self.list(|r| range.contains(r.date)).await)
    }

    async fn get_by_region(
        &self,
        region: &str,
        range: DateRange,
    ) -> Result<Vec<FireIncident>, StoreError> {
        Ok(self
            .list(|r| r.region == region && range.contains(r.date))
            .await)
    }

    async fn get_by_id(&self, id: DbId) -> Result<Option<FireIncident>, StoreError> {
        let state = self.state.read().await;
        Ok(state.rows.get(&id).map(|r| FireIncident {
            id,
            report: r.clone(),
        }))
    }

    async fn add(&self, report: &FireReport) -> Result<FireIncident, StoreError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = state.next_id;
        state.rows.insert(id, report.clone());
        Ok(FireIncident {
            id,
            report: report.clone(),
        })
    }

    async fn update(&self, incident: &FireIncident) -> Result<FireIncident, StoreError> {
        let mut state = self.state.write().await;
        match state.rows.get_mut(&incident.id) {
            Some(row) => {
                *row = incident.report.clone();
                Ok(incident.clone())
            }
            None => Err(StoreError::NotFound(incident.id)),
        }
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.state.write().await.rows.remove(&id).is_some())
    }

    async fn get_all_regions(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        let mut regions: Vec<String> = state.rows.values().map(|r| r.region.clone()).collect();
        regions.sort();
        regions.dedup();
        Ok(regions)
    }
}
