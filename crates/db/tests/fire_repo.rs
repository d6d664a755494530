//! Integration tests for the PostgreSQL repositories.
//!
//! These need a live database (`DATABASE_URL`); run with `--ignored`.

use chrono::NaiveDate;
use firewatch_core::audit::{actions, entities, NewAuditEntry};
use firewatch_core::incident::{
    DamageBreakdown, DateRange, FireReport, ResponderRoster, ResponderUnit,
};
use firewatch_core::roles::{Role, RoleSet};
use firewatch_core::store::FireStore;
use firewatch_db::models::audit::AuditQuery;
use firewatch_db::models::user::CreateUser;
use firewatch_db::repositories::{AuditLogRepo, FireRepo, UserRepo};
use firewatch_db::PgFireStore;
use sqlx::PgPool;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn report(region: &str, day: u32) -> FireReport {
    FireReport {
        date: date(2024, 6, day),
        region: region.to_string(),
        location: "Лесничество".to_string(),
        branch: Some("North".to_string()),
        forestry: None,
        quarter: Some("12".to_string()),
        allotment: None,
        damage_area: Some(2.5),
        damage: DamageBreakdown {
            forest: Some(1.5),
            forest_covered: Some(1.0),
            crown: None,
            non_forest: Some(1.0),
        },
        responders: ResponderRoster {
            forest_protection: ResponderUnit {
                engaged: true,
                people: Some(4),
                equipment: Some(2),
                aircraft: Some(1),
            },
            ..Default::default()
        },
        damage_amount: Some(1000),
        firefighting_cost: Some(250),
        misc_code: None,
        description: Some("lightning strike".to_string()),
        attachment: None,
        reviewed: false,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn health_check_succeeds(pool: PgPool) {
    firewatch_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn create_round_trips_every_column(pool: PgPool) {
    let input = report("A", 1);
    let created = FireRepo::create(&pool, &input).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.report, input);

    let fetched = FireRepo::find_by_id(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_filters_by_region_and_inclusive_dates(pool: PgPool) {
    for (region, day) in [("A", 1), ("A", 10), ("B", 10), ("A", 20), ("A", 21)] {
        FireRepo::create(&pool, &report(region, day)).await.unwrap();
    }

    let range = DateRange::between(date(2024, 6, 1), date(2024, 6, 20));
    let rows = FireRepo::list(&pool, Some("A"), range).await.unwrap();
    let days: Vec<_> = rows.iter().map(|r| r.report.date).collect();
    assert_eq!(days, vec![date(2024, 6, 20), date(2024, 6, 10), date(2024, 6, 1)]);

    let all = FireRepo::list(&pool, None, DateRange::unbounded()).await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(
        FireRepo::distinct_regions(&pool).await.unwrap(),
        vec!["A", "B"]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_and_delete_report_missing_rows(pool: PgPool) {
    let store = PgFireStore::new(pool.clone());
    let mut incident = store.add(&report("A", 1)).await.unwrap();

    incident.report.location = "Moved".to_string();
    incident.report.reviewed = true;
    let updated = store.update(&incident).await.unwrap();
    assert_eq!(updated.report.location, "Moved");
    assert!(updated.report.reviewed);

    assert!(store.delete(incident.id).await.unwrap());
    assert!(!store.delete(incident.id).await.unwrap());
    assert!(store.update(&incident).await.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_username_violates_unique_constraint(pool: PgPool) {
    let input = CreateUser {
        username: "ranger".to_string(),
        password_hash: "hash".to_string(),
        roles: RoleSet::from([Role::Engineer]),
        region: "A".to_string(),
    };
    let user = UserRepo::create(&pool, &input).await.unwrap();
    assert_eq!(user.role_set(), RoleSet::from([Role::Engineer]));

    let err = UserRepo::create(&pool, &input).await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_users_username"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn audit_log_is_append_only_and_newest_first(pool: PgPool) {
    for id in 1..=3 {
        let entry = NewAuditEntry::new("admin", actions::CREATE, entities::FIRE).record(id);
        AuditLogRepo::insert(&pool, &entry).await.unwrap();
    }

    let page = AuditLogRepo::query(&pool, &AuditQuery::default()).await.unwrap();
    let ids: Vec<_> = page.iter().map(|l| l.record_id).collect();
    assert_eq!(ids, vec![Some(3), Some(2), Some(1)]);
    assert_eq!(AuditLogRepo::count(&pool, &AuditQuery::default()).await.unwrap(), 3);

    let tamper = sqlx::query("UPDATE audit_logs SET username = 'mallory'")
        .execute(&pool)
        .await;
    assert!(tamper.is_err());
}
