//! Handlers for `/admin/users` (user management).
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use firewatch_core::access::Action;
use firewatch_core::audit::{actions, entities, NewAuditEntry};
use firewatch_core::error::CoreError;
use firewatch_core::roles::RoleSet;
use firewatch_core::types::DbId;
use firewatch_db::models::user::{CreateUser, UserResponse};
use firewatch_db::repositories::UserRepo;
use serde::Deserialize;
use validator::Validate;

use super::record_audit;
use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150, message = "must be between 1 and 150 characters"))]
    pub username: String,
    pub password: String,
    pub roles: RoleSet,
    pub region: String,
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    admin.authorize(&state, Action::ManageUsers, &[])?;
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/v1/admin/users
///
/// Validates the roles, region, and password strength, then stores an
/// Argon2id hash. Returns 201 with the safe [`UserResponse`].
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    admin.authorize(&state, Action::ManageUsers, &[])?;
    input.validate()?;

    let username = input.username.trim().to_string();
    if username.is_empty() {
        return Err(CoreError::Validation("username must not be empty".into()).into());
    }
    if input.roles.is_empty() {
        return Err(CoreError::Validation("at least one role is required".into()).into());
    }
    state.catalog.validate_region(&input.region)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            password_hash,
            roles: input.roles,
            region: input.region,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, created_by = admin.principal.user_id, "User created");

    record_audit(
        &state,
        NewAuditEntry::new(&admin.principal.username, actions::CREATE, entities::USER)
            .record(user.id)
            .changes(format!(
                "username: {}; roles: {}; region: {}",
                user.username,
                user.roles.join(","),
                user.region
            )),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Returns 204. Admins cannot delete their own account.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    admin.authorize(&state, Action::ManageUsers, &[])?;
    if id == admin.principal.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }

    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    if !UserRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    tracing::info!(user_id = id, deleted_by = admin.principal.user_id, "User deleted");

    record_audit(
        &state,
        NewAuditEntry::new(&admin.principal.username, actions::DELETE, entities::USER)
            .record(id)
            .changes(format!("username: {}", user.username)),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
