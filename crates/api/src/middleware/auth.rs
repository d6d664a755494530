//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use firewatch_core::access::{Action, Principal, RequestContext};
use firewatch_core::error::CoreError;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated caller extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.principal.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
}

impl AuthUser {
    /// Check `action` against the access policy, optionally scoped to regions.
    pub fn authorize(&self, state: &AppState, action: Action, regions: &[&str]) -> AppResult<()> {
        let ctx = regions
            .iter()
            .fold(RequestContext::new(&self.principal, action), |ctx, r| {
                ctx.with_region(*r)
            });
        state.policy.authorize(&ctx)?;
        Ok(())
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let principal = claims.principal();
        if !state.accounts.is_active(principal.user_id).await? {
            tracing::warn!(user_id = principal.user_id, "Token presented for a deleted account");
            return Err(AppError::Core(CoreError::Unauthorized(
                "Account no longer exists".into(),
            )));
        }

        Ok(AuthUser { principal })
    }
}
