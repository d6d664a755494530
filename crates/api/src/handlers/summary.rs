//! Handler for the `/summary` resource.

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use firewatch_core::access::Action;
use firewatch_core::summary::{summarize, FireSummary, SummaryFilter};
use serde::Deserialize;

use super::fires::DateRangeParams;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /summary`.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Comma-separated region names; `all` disables the filter.
    pub regions: Option<String>,
}

impl SummaryParams {
    pub fn filter(&self) -> AppResult<SummaryFilter> {
        let date_range = DateRangeParams {
            start_date: self.start_date,
            end_date: self.end_date,
        }
        .range()?;

        let regions = self.regions.as_deref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        Ok(SummaryFilter {
            regions,
            date_range,
        })
    }
}

/// GET /api/v1/summary
///
/// Per-region and overall totals over the records the caller may see.
pub async fn get_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<DataResponse<FireSummary>>> {
    user.authorize(&state, Action::ViewSummary, &[])?;
    let filter = params.filter()?;

    let records = state.store.get_all(filter.date_range).await?;
    let visible = state.policy.visible_records(&user.principal, records);
    let summary = summarize(&visible, &filter);

    tracing::debug!(
        user_id = user.principal.user_id,
        regions = summary.per_region.len(),
        fire_count = summary.totals.fire_count,
        "Summary computed"
    );

    Ok(Json(DataResponse { data: summary }))
}
