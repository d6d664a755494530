//! Startup tasks that run before the server accepts requests.

use firewatch_core::error::CoreError;
use firewatch_core::regions::RegionCatalog;
use firewatch_core::roles::{Role, RoleSet};
use firewatch_db::models::user::CreateUser;
use firewatch_db::repositories::UserRepo;
use firewatch_db::DbPool;

use crate::auth::password::hash_password;
use crate::config::BootstrapAdmin;
use crate::error::{AppError, AppResult};

/// Load the region catalog from `path`, or the built-in one when unset.
pub fn load_catalog(path: Option<&str>) -> AppResult<RegionCatalog> {
    let Some(path) = path else {
        return Ok(RegionCatalog::builtin());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| AppError::InternalError(format!("Cannot read region catalog {path}: {e}")))?;
    Ok(RegionCatalog::from_json_str(&json)?)
}

/// Create the bootstrap admin in the first catalog region if no user with
/// that name exists. Returns `true` when a user was created.
pub async fn ensure_admin(
    pool: &DbPool,
    catalog: &RegionCatalog,
    admin: &BootstrapAdmin,
) -> AppResult<bool> {
    if UserRepo::find_by_username(pool, &admin.username)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let region = catalog
        .all_regions()
        .first()
        .map(|r| r.to_string())
        .ok_or_else(|| CoreError::Validation("Region catalog is empty".into()))?;

    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: admin.username.clone(),
            password_hash,
            roles: RoleSet::from([Role::Admin]),
            region,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_path_uses_builtin_catalog() {
        let catalog = load_catalog(None).unwrap();
        assert_eq!(catalog.all_regions(), RegionCatalog::builtin().all_regions());
    }

    #[test]
    fn unreadable_path_is_an_internal_error() {
        assert_matches!(
            load_catalog(Some("/nonexistent/regions.json")),
            Err(AppError::InternalError(_))
        );
    }
}
