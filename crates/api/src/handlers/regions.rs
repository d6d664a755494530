//! Handlers for the `/regions` resource (region/location catalog).

use axum::extract::{Path, State};
use axum::Json;
use firewatch_core::access::Action;
use indexmap::IndexMap;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/regions
///
/// Regions the caller may file records in: every region for unscoped roles,
/// otherwise only their own.
pub async fn list_regions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let regions = state
        .policy
        .selectable_regions(&user.principal, &state.catalog)
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(Json(DataResponse { data: regions }))
}

/// GET /api/v1/regions/mapping
///
/// The full region to locations mapping, in catalog order.
pub async fn region_mapping(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<IndexMap<String, Vec<String>>>>> {
    Ok(Json(DataResponse {
        data: state.catalog.mapping().clone(),
    }))
}

/// GET /api/v1/regions/{region}/locations
pub async fn list_locations(
    State(state): State<AppState>,
    user: AuthUser,
    Path(region): Path<String>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    user.authorize(&state, Action::ListLocations, &[])?;
    state.catalog.validate_region(&region)?;
    Ok(Json(DataResponse {
        data: state.catalog.locations(&region).to_vec(),
    }))
}
