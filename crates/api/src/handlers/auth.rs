//! Handlers for the `/auth` resource (login, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use firewatch_core::audit::{actions, entities, NewAuditEntry};
use firewatch_core::error::CoreError;
use firewatch_db::models::user::UserResponse;
use firewatch_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use super::record_audit;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Both outcomes are audited.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let username = input.username.trim();

    let Some(user) = UserRepo::find_by_username(&state.pool, username).await? else {
        tracing::info!(%username, "Login failed: unknown user");
        record_audit(
            &state,
            NewAuditEntry::new(username, actions::LOGIN_FAILED, entities::USER),
        )
        .await;
        return Err(invalid_credentials());
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        record_audit(
            &state,
            NewAuditEntry::new(&user.username, actions::LOGIN_FAILED, entities::USER)
                .record(user.id),
        )
        .await;
        return Err(invalid_credentials());
    }

    let principal = user.principal();
    let access_token = generate_access_token(&principal, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");
    record_audit(
        &state,
        NewAuditEntry::new(&user.username, actions::LOGIN, entities::USER).record(user.id),
    )
    .await;

    Ok(Json(AuthResponse {
        access_token,
        expires_in: state.config.jwt.expires_in(),
        user: UserResponse::from(&user),
    }))
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless, so logout only records the event. Returns 204.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let principal = &auth_user.principal;
    tracing::info!(user_id = principal.user_id, "User logged out");
    record_audit(
        &state,
        NewAuditEntry::new(&principal.username, actions::LOGOUT, entities::USER)
            .record(principal.user_id),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}
