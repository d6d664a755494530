//! Handlers for the `/fires` resource.
//!
//! Every handler checks the action against the access policy. Record-level
//! handlers check the role first, then load the record, then check its
//! region, so a missing id is a 404 only for callers who could see it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use firewatch_core::access::Action;
use firewatch_core::audit::{
    actions, describe_report, diff_fields, entities, render_changes, NewAuditEntry,
};
use firewatch_core::error::CoreError;
use firewatch_core::incident::{DateRange, FireIncident, FireReport};
use firewatch_core::store::FIRE_ENTITY;
use firewatch_core::types::DbId;
use serde::Deserialize;

use super::record_audit;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional inclusive date bounds, `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRangeParams {
    pub fn range(&self) -> AppResult<DateRange> {
        let range = DateRange {
            start: self.start_date,
            end: self.end_date,
        };
        range.validate()?;
        Ok(range)
    }
}

/// GET /api/v1/fires
///
/// Newest first. Region-scoped roles only see their own region.
pub async fn list_fires(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<DateRangeParams>,
) -> AppResult<Json<DataResponse<Vec<FireIncident>>>> {
    user.authorize(&state, Action::ListRecords, &[])?;
    let range = params.range()?;

    let records = state.store.get_all(range).await?;
    let visible = state.policy.visible_records(&user.principal, records);

    Ok(Json(DataResponse { data: visible }))
}

/// GET /api/v1/fires/{id}
pub async fn get_fire(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FireIncident>>> {
    user.authorize(&state, Action::ViewRecord, &[])?;
    let incident = find_fire(&state, id).await?;
    user.authorize(&state, Action::ViewRecord, &[incident.region()])?;

    Ok(Json(DataResponse { data: incident }))
}

/// POST /api/v1/fires
///
/// Validate and normalize the report, store it, and audit the creation.
pub async fn create_fire(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<FireReport>,
) -> AppResult<(StatusCode, Json<DataResponse<FireIncident>>)> {
    user.authorize(&state, Action::CreateRecord, &[])?;
    let report = input.prepare(&state.catalog)?;
    user.authorize(&state, Action::CreateRecord, &[report.region.as_str()])?;

    let incident = state.store.add(&report).await?;
    tracing::info!(
        fire_id = incident.id,
        user_id = user.principal.user_id,
        region = %incident.report.region,
        "Fire record created"
    );

    record_audit(
        &state,
        NewAuditEntry::new(&user.principal.username, actions::CREATE, entities::FIRE)
            .record(incident.id)
            .changes(describe_report(&incident.report)),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: incident })))
}

/// PUT /api/v1/fires/{id}
///
/// Replace every field of a record. Moving a record to another region needs
/// access to both regions. Unchanged edits write no audit entry.
pub async fn update_fire(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<FireReport>,
) -> AppResult<Json<DataResponse<FireIncident>>> {
    user.authorize(&state, Action::EditRecord, &[])?;
    let existing = find_fire(&state, id).await?;
    user.authorize(&state, Action::EditRecord, &[existing.region()])?;
    let report = input.prepare(&state.catalog)?;
    user.authorize(&state, Action::EditRecord, &[report.region.as_str()])?;

    let updated = state.store.update(&FireIncident { id, report }).await?;
    tracing::info!(fire_id = id, user_id = user.principal.user_id, "Fire record updated");

    let changes = diff_fields(&existing.report, &updated.report)?;
    if let Some(description) = render_changes(&changes) {
        record_audit(
            &state,
            NewAuditEntry::new(&user.principal.username, actions::UPDATE, entities::FIRE)
                .record(id)
                .changes(description),
        )
        .await;
    }

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/fires/{id}
///
/// Returns 204. The id is never reused.
pub async fn delete_fire(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    user.authorize(&state, Action::DeleteRecord, &[])?;
    let existing = find_fire(&state, id).await?;

    if !state.store.delete(id).await? {
        return Err(not_found(id).into());
    }
    tracing::info!(fire_id = id, user_id = user.principal.user_id, "Fire record deleted");

    record_audit(
        &state,
        NewAuditEntry::new(&user.principal.username, actions::DELETE, entities::FIRE)
            .record(id)
            .changes(describe_report(&existing.report)),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: FIRE_ENTITY,
        id,
    }
}

async fn find_fire(state: &AppState, id: DbId) -> AppResult<FireIncident> {
    state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(id).into())
}
