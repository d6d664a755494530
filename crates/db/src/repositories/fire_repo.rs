//! Repository for the `fires` table.

use chrono::NaiveDate;
use firewatch_core::incident::{DateRange, FireIncident, FireReport, ResponderCategory};
use firewatch_core::types::DbId;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};

use crate::models::fire::FireRow;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for SELECT / RETURNING.
const COLUMNS: &str = "\
    id, date, region, location, branch, forestry, quarter, allotment, \
    damage_area, damage_forest, damage_forest_covered, damage_crown, damage_non_forest, \
    local_authority_engaged, local_authority_people, local_authority_equipment, \
    forest_protection_engaged, forest_protection_people, forest_protection_equipment, \
    forest_protection_aircraft, \
    emergency_service_engaged, emergency_service_people, emergency_service_equipment, \
    emergency_service_aircraft, \
    internal_affairs_engaged, internal_affairs_people, internal_affairs_equipment, \
    internal_affairs_aircraft, \
    other_organizations_engaged, other_organizations_people, other_organizations_equipment, \
    other_organizations_aircraft, \
    damage_amount, firefighting_cost, misc_code, description, attachment, reviewed, \
    created_at, updated_at";

/// Writable columns, in the order [`bind_report`] binds them.
const REPORT_COLUMNS: &str = "\
    date, region, location, branch, forestry, quarter, allotment, \
    damage_area, damage_forest, damage_forest_covered, damage_crown, damage_non_forest, \
    local_authority_engaged, local_authority_people, local_authority_equipment, \
    forest_protection_engaged, forest_protection_people, forest_protection_equipment, \
    forest_protection_aircraft, \
    emergency_service_engaged, emergency_service_people, emergency_service_equipment, \
    emergency_service_aircraft, \
    internal_affairs_engaged, internal_affairs_people, internal_affairs_equipment, \
    internal_affairs_aircraft, \
    other_organizations_engaged, other_organizations_people, other_organizations_equipment, \
    other_organizations_aircraft, \
    damage_amount, firefighting_cost, misc_code, description, attachment, reviewed";

fn report_columns() -> impl Iterator<Item = &'static str> {
    REPORT_COLUMNS.split(',').map(str::trim)
}

/// Provides storage operations for fire incidents.
pub struct FireRepo;

impl FireRepo {
    /// Insert a new incident, returning it with its assigned id.
    pub async fn create(pool: &PgPool, report: &FireReport) -> Result<FireIncident, sqlx::Error> {
        let placeholders: Vec<String> = (1..=report_columns().count())
            .map(|i| format!("${i}"))
            .collect();
        let query = format!(
            "INSERT INTO fires ({REPORT_COLUMNS}) VALUES ({}) RETURNING {COLUMNS}",
            placeholders.join(", ")
        );
        let row = bind_report(sqlx::query_as::<_, FireRow>(&query), report)
            .fetch_one(pool)
            .await?;
        Ok(row.into())
    }

    /// Find an incident by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FireIncident>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fires WHERE id = $1");
        let row = sqlx::query_as::<_, FireRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// List incidents, newest first, optionally restricted to one region.
    ///
    /// Both date bounds are inclusive.
    pub async fn list(
        pool: &PgPool,
        region: Option<&str>,
        range: DateRange,
    ) -> Result<Vec<FireIncident>, sqlx::Error> {
        let (where_clause, bind_values) = build_fire_filter(region, range);
        let query = format!(
            "SELECT {COLUMNS} FROM fires {where_clause} ORDER BY date DESC, id DESC"
        );

        let mut q = sqlx::query_as::<_, FireRow>(&query);
        for val in &bind_values {
            match val {
                BindValue::Text(v) => q = q.bind(v.as_str()),
                BindValue::Date(v) => q = q.bind(*v),
            }
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Replace every writable column of an incident.
    ///
    /// Returns `None` if no row with the given id exists.
    pub async fn update(
        pool: &PgPool,
        incident: &FireIncident,
    ) -> Result<Option<FireIncident>, sqlx::Error> {
        let sets: Vec<String> = report_columns()
            .enumerate()
            .map(|(i, col)| format!("{col} = ${}", i + 2))
            .collect();
        let query = format!(
            "UPDATE fires SET {} WHERE id = $1 RETURNING {COLUMNS}",
            sets.join(", ")
        );
        let q = sqlx::query_as::<_, FireRow>(&query).bind(incident.id);
        let row = bind_report(q, &incident.report)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Delete an incident. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fires WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct regions that have at least one incident, sorted by name.
    pub async fn distinct_regions(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT region FROM fires ORDER BY region")
            .fetch_all(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Bind every writable column of `report`, in [`REPORT_COLUMNS`] order.
fn bind_report<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    report: &'q FireReport,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    let mut q = q
        .bind(report.date)
        .bind(report.region.as_str())
        .bind(report.location.as_str())
        .bind(report.branch.as_deref())
        .bind(report.forestry.as_deref())
        .bind(report.quarter.as_deref())
        .bind(report.allotment.as_deref())
        .bind(report.damage_area)
        .bind(report.damage.forest)
        .bind(report.damage.forest_covered)
        .bind(report.damage.crown)
        .bind(report.damage.non_forest);

    for category in ResponderCategory::ALL {
        let unit = report.responders.unit(category);
        q = q.bind(unit.engaged).bind(unit.people).bind(unit.equipment);
        if category.tracks_aircraft() {
            q = q.bind(unit.aircraft);
        }
    }

    q.bind(report.damage_amount)
        .bind(report.firefighting_cost)
        .bind(report.misc_code)
        .bind(report.description.as_deref())
        .bind(report.attachment.as_deref())
        .bind(report.reviewed)
}

/// Typed bind value for dynamically-built fire queries.
enum BindValue {
    Text(String),
    Date(NaiveDate),
}

/// Build a WHERE clause for the region and date filters.
fn build_fire_filter(region: Option<&str>, range: DateRange) -> (String, Vec<BindValue>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(region) = region {
        bind_values.push(BindValue::Text(region.to_string()));
        conditions.push(format!("region = ${}", bind_values.len()));
    }
    if let Some(start) = range.start {
        bind_values.push(BindValue::Date(start));
        conditions.push(format!("date >= ${}", bind_values.len()));
    }
    if let Some(end) = range.end {
        bind_values.push(BindValue::Date(end));
        conditions.push(format!("date <= ${}", bind_values.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, bind_values)
}
