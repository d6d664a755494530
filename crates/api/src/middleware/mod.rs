//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated principal from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//!
//! Record-level checks (region scoping) go through the access policy in
//! the handlers, since they need the target record first.

pub mod auth;
pub mod rbac;
