//! Fire incident row model.
//!
//! The `fires` table stores the responder roster and damage breakdown as flat
//! columns; [`FireRow`] converts into the nested domain type.

use chrono::NaiveDate;
use firewatch_core::incident::{
    DamageBreakdown, FireIncident, FireReport, ResponderRoster, ResponderUnit,
};
use firewatch_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full row from the `fires` table.
#[derive(Debug, Clone, FromRow)]
pub struct FireRow {
    pub id: DbId,
    pub date: NaiveDate,
    pub region: String,
    pub location: String,
    pub branch: Option<String>,
    pub forestry: Option<String>,
    pub quarter: Option<String>,
    pub allotment: Option<String>,
    pub damage_area: Option<f64>,
    pub damage_forest: Option<f64>,
    pub damage_forest_covered: Option<f64>,
    pub damage_crown: Option<f64>,
    pub damage_non_forest: Option<f64>,
    pub local_authority_engaged: bool,
    pub local_authority_people: Option<i32>,
    pub local_authority_equipment: Option<i32>,
    pub forest_protection_engaged: bool,
    pub forest_protection_people: Option<i32>,
    pub forest_protection_equipment: Option<i32>,
    pub forest_protection_aircraft: Option<i32>,
    pub emergency_service_engaged: bool,
    pub emergency_service_people: Option<i32>,
    pub emergency_service_equipment: Option<i32>,
    pub emergency_service_aircraft: Option<i32>,
    pub internal_affairs_engaged: bool,
    pub internal_affairs_people: Option<i32>,
    pub internal_affairs_equipment: Option<i32>,
    pub internal_affairs_aircraft: Option<i32>,
    pub other_organizations_engaged: bool,
    pub other_organizations_people: Option<i32>,
    pub other_organizations_equipment: Option<i32>,
    pub other_organizations_aircraft: Option<i32>,
    pub damage_amount: Option<i64>,
    pub firefighting_cost: Option<i64>,
    pub misc_code: Option<i64>,
    pub description: Option<String>,
    pub attachment: Option<String>,
    pub reviewed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn unit(
    engaged: bool,
    people: Option<i32>,
    equipment: Option<i32>,
    aircraft: Option<i32>,
) -> ResponderUnit {
    ResponderUnit {
        engaged,
        people,
        equipment,
        aircraft,
    }
}

impl From<FireRow> for FireIncident {
    fn from(row: FireRow) -> Self {
        let responders = ResponderRoster {
            local_authority: unit(
                row.local_authority_engaged,
                row.local_authority_people,
                row.local_authority_equipment,
                None,
            ),
            forest_protection: unit(
                row.forest_protection_engaged,
                row.forest_protection_people,
                row.forest_protection_equipment,
                row.forest_protection_aircraft,
            ),
            emergency_service: unit(
                row.emergency_service_engaged,
                row.emergency_service_people,
                row.emergency_service_equipment,
                row.emergency_service_aircraft,
            ),
            internal_affairs: unit(
                row.internal_affairs_engaged,
                row.internal_affairs_people,
                row.internal_affairs_equipment,
                row.internal_affairs_aircraft,
            ),
            other_organizations: unit(
                row.other_organizations_engaged,
                row.other_organizations_people,
                row.other_organizations_equipment,
                row.other_organizations_aircraft,
            ),
        };

        FireIncident {
            id: row.id,
            report: FireReport {
                date: row.date,
                region: row.region,
                location: row.location,
                branch: row.branch,
                forestry: row.forestry,
                quarter: row.quarter,
                allotment: row.allotment,
                damage_area: row.damage_area,
                damage: DamageBreakdown {
                    forest: row.damage_forest,
                    forest_covered: row.damage_forest_covered,
                    crown: row.damage_crown,
                    non_forest: row.damage_non_forest,
                },
                responders,
                damage_amount: row.damage_amount,
                firefighting_cost: row.firefighting_cost,
                misc_code: row.misc_code,
                description: row.description,
                attachment: row.attachment,
                reviewed: row.reviewed,
            },
        }
    }
}
