//! Repositories: one zero-sized struct per table, each method taking the pool.

pub mod audit_repo;
pub mod fire_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use fire_repo::FireRepo;
pub use user_repo::UserRepo;
