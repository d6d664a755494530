use std::sync::Arc;

use firewatch_core::access::AccessPolicy;
use firewatch_core::audit::AuditTrail;
use firewatch_core::regions::RegionCatalog;
use firewatch_core::store::FireStore;
use firewatch_db::{PgAuditSink, PgFireStore};

use crate::auth::accounts::{AccountDirectory, PgAccountDirectory};
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: firewatch_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Fire incident storage.
    pub store: Arc<dyn FireStore>,
    /// Valid regions and their locations. Immutable after startup.
    pub catalog: Arc<RegionCatalog>,
    /// Authorization rule chain.
    pub policy: Arc<AccessPolicy>,
    pub audit: AuditTrail,
    /// Accounts that may still use their tokens.
    pub accounts: Arc<dyn AccountDirectory>,
}

impl AppState {
    /// Wire the PostgreSQL-backed store and audit sink around `pool`.
    pub fn new(pool: firewatch_db::DbPool, config: ServerConfig, catalog: RegionCatalog) -> Self {
        let audit = AuditTrail::new(
            Arc::new(PgAuditSink::new(pool.clone())),
            config.audit.retry_policy(),
        );
        Self {
            store: Arc::new(PgFireStore::new(pool.clone())),
            accounts: Arc::new(PgAccountDirectory::new(pool.clone())),
            pool,
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            policy: Arc::new(AccessPolicy::standard()),
            audit,
        }
    }
}
