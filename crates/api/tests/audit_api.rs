//! HTTP-level tests for audit log browsing and CSV export.

mod common;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use common::{body_bytes, body_json, build_test_app, db_token, get_auth, REGION_A};
use firewatch_core::audit::{actions, entities, NewAuditEntry};
use firewatch_core::roles::Role;
use firewatch_db::repositories::AuditLogRepo;
use sqlx::PgPool;

async fn seed(pool: &PgPool) {
    let entries = [
        NewAuditEntry::new("alice", actions::CREATE, entities::FIRE)
            .record(1)
            .changes("date: 2024-07-01; region: A; location: X"),
        NewAuditEntry::new("bob", actions::UPDATE, entities::FIRE)
            .record(1)
            .changes("damage_area: 1.5 -> 4.0"),
        NewAuditEntry::new("ghost", actions::LOGIN_FAILED, entities::USER),
    ];
    for entry in &entries {
        AuditLogRepo::insert(pool, entry).await.unwrap();
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_query_pages_newest_first(pool: PgPool) {
    seed(&pool).await;
    let admin = db_token(&pool, "admin", &[Role::Admin], REGION_A).await;

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/admin/audit-logs?limit=2",
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 3);
    let items = json["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["username"], "ghost");
    assert_eq!(items[1]["username"], "bob");

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/admin/audit-logs?limit=2&offset=2",
        &admin,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["items"][0]["username"], "alice");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_query_filters_by_user_and_action(pool: PgPool) {
    seed(&pool).await;
    let admin = db_token(&pool, "admin", &[Role::Admin], REGION_A).await;

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/admin/audit-logs?username=bob&action=update",
        &admin,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["items"][0]["record_id"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_export_is_csv_attachment_in_newest_first_order(pool: PgPool) {
    seed(&pool).await;
    let admin = db_token(&pool, "admin", &[Role::Admin], REGION_A).await;

    let response = get_auth(
        build_test_app(pool),
        "/api/v1/admin/audit-logs/export",
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE].to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION].to_str().unwrap(),
        "attachment; filename=\"audit_logs.csv\""
    );

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Timestamp,Username,Action"));
    assert!(lines[1].contains(",ghost,login_failed,User,,"));
    assert!(lines[2].contains(",bob,update,Fire,1,"));
    assert!(lines[3].ends_with(",alice,create,Fire,1,date: 2024-07-01; region: A; location: X"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_export_of_empty_log_is_header_only(pool: PgPool) {
    let admin = db_token(&pool, "admin", &[Role::Admin], REGION_A).await;

    let response = get_auth(
        build_test_app(pool),
        "/api/v1/admin/audit-logs/export",
        &admin,
    )
    .await;
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(body.lines().count(), 1);
}
