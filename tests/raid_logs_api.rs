//! HTTP-level tests of the raid log endpoints against a migrated database.

mod common;

use axum::http::StatusCode;
use chrono::{NaiveDate, TimeZone, Utc};
use common::{
    build_test_app, count, get, insert_forecast, insert_log, insert_user, post_json, seed, send,
    token_for, Fixture, Flags, PUBLIC,
};
use serde_json::json;
use sqlx::PgPool;

fn submission(fixture: &Fixture, wind_speed: f64, swell_height: f64) -> serde_json::Value {
    json!({
        "date": "2024-06-01",
        "regionId": fixture.region_id,
        "beachId": fixture.beach_id,
        "surferName": "Layne",
        "surferRating": 4,
        "forecast": {
            "wind": { "speed": wind_speed, "direction": 45.0 },
            "swell": { "height": swell_height, "period": 14.0, "direction": 200.0 }
        }
    })
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn june(day: u32, hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

fn ids(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|log| log["id"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_same_day_and_region_reuses_first_forecast(pool: PgPool) {
    let fixture = seed(&pool).await;
    let token = token_for(fixture.user_id);

    let (status, first) = send(
        build_test_app(pool.clone()),
        post_json("/api/v1/raid-logs", submission(&fixture, 8.0, 2.1), &token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = send(
        build_test_app(pool.clone()),
        post_json("/api/v1/raid-logs", submission(&fixture, 25.0, 0.4), &token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_ne!(first["id"], second["id"]);
    assert_eq!(first["forecast"]["id"], second["forecast"]["id"]);
    assert_eq!(second["forecast"]["wind"]["speed"], 8.0);
    assert_eq!(second["forecast"]["swell"]["height"], 2.1);
    assert_eq!(count(&pool, "forecasts").await, 1);
    assert_eq!(count(&pool, "log_entries").await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_created_log_nests_relations_and_session_email(pool: PgPool) {
    let fixture = seed(&pool).await;
    let token = token_for(fixture.user_id);

    let (status, created) = send(
        build_test_app(pool),
        post_json("/api/v1/raid-logs", submission(&fixture, 8.0, 2.1), &token),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["region"]["country"], "Indonesia");
    assert_eq!(created["beach"]["name"], "Uluwatu");
    assert_eq!(created["user"]["name"], "Layne");
    assert_eq!(created["forecast"]["swell"]["cardinalDirection"], "S");
    assert_eq!(
        created["surferEmail"],
        format!("{}@surf.test", fixture.user_id)
    );
    assert_eq!(created["hasAlert"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_created_alert_is_reported_to_its_owner_only(pool: PgPool) {
    let fixture = seed(&pool).await;
    let owner = token_for(fixture.user_id);
    let mut body = submission(&fixture, 8.0, 2.1);
    body["createAlert"] = json!(true);
    body["alertConfig"] = json!({
        "name": "Uluwatu pumping",
        "notificationMethod": "email",
        "contactInfo": "layne@surf.test"
    });

    let (status, created) = send(
        build_test_app(pool.clone()),
        post_json("/api/v1/raid-logs", body, &owner),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["hasAlert"], true);
    assert_eq!(created["isMyAlert"], true);

    let (_, listed) = send(
        build_test_app(pool.clone()),
        get("/api/v1/raid-logs", Some(&owner)),
    )
    .await;
    assert_eq!(listed[0]["alertId"], created["alertId"]);
    assert_eq!(listed[0]["isMyAlert"], true);

    let (_, listed) = send(build_test_app(pool), get("/api/v1/raid-logs", None)).await;
    assert_eq!(listed[0]["hasAlert"], true);
    assert_eq!(listed[0]["isMyAlert"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_alert_insert_rolls_back_the_log(pool: PgPool) {
    let fixture = seed(&pool).await;
    sqlx::query("ALTER TABLE alerts ADD CONSTRAINT alerts_name_accepted CHECK (name <> 'rejected')")
        .execute(&pool)
        .await
        .unwrap();

    let mut body = submission(&fixture, 8.0, 2.1);
    body["createAlert"] = json!(true);
    body["alertConfig"] = json!({
        "name": "rejected",
        "notificationMethod": "email",
        "contactInfo": "layne@surf.test"
    });

    let (status, error) = send(
        build_test_app(pool.clone()),
        post_json("/api/v1/raid-logs", body, &token_for(fixture.user_id)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["error"], "Internal database error");
    assert_eq!(count(&pool, "log_entries").await, 0);
    assert_eq!(count(&pool, "forecasts").await, 0);
    assert_eq!(count(&pool, "alerts").await, 0);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_anonymous_listing_shows_public_logs_newest_first(pool: PgPool) {
    let fixture = seed(&pool).await;
    let forecast = insert_forecast(&pool, fixture.region_id, day(1)).await;
    let user = fixture.user_id;

    let older = insert_log(&pool, &fixture, user, forecast, june(1, 7), PUBLIC).await;
    let newer = insert_log(&pool, &fixture, user, forecast, june(3, 7), PUBLIC).await;
    let private = Flags {
        is_private: true,
        is_anonymous: false,
    };
    insert_log(&pool, &fixture, user, forecast, june(2, 7), private).await;
    let anonymous = Flags {
        is_private: false,
        is_anonymous: true,
    };
    insert_log(&pool, &fixture, user, forecast, june(4, 7), anonymous).await;

    let (status, listed) = send(build_test_app(pool), get("/api/v1/raid-logs", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&listed), vec![newer.to_string(), older.to_string()]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_owner_sees_own_private_logs_but_others_do_not(pool: PgPool) {
    let fixture = seed(&pool).await;
    let stranger = insert_user(&pool, "Kelly").await;
    let forecast = insert_forecast(&pool, fixture.region_id, day(1)).await;
    let private = Flags {
        is_private: true,
        is_anonymous: false,
    };
    let hidden = insert_log(&pool, &fixture, fixture.user_id, forecast, june(2, 7), private).await;

    let (_, mine) = send(
        build_test_app(pool.clone()),
        get("/api/v1/raid-logs?isPrivate=true", Some(&token_for(fixture.user_id))),
    )
    .await;
    assert_eq!(ids(&mine), vec![hidden.to_string()]);

    let uri = format!("/api/v1/raid-logs?userId={}", fixture.user_id);
    let (_, theirs) = send(
        build_test_app(pool),
        get(&uri, Some(&token_for(stranger))),
    )
    .await;
    assert!(ids(&theirs).is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_end_date_includes_that_whole_day(pool: PgPool) {
    let fixture = seed(&pool).await;
    let forecast = insert_forecast(&pool, fixture.region_id, day(10)).await;
    let user = fixture.user_id;

    let before = insert_log(&pool, &fixture, user, forecast, june(9, 23), PUBLIC).await;
    let late_on_end_day = insert_log(&pool, &fixture, user, forecast, june(10, 18), PUBLIC).await;
    insert_log(&pool, &fixture, user, forecast, june(11, 0), PUBLIC).await;

    let (status, listed) = send(
        build_test_app(pool),
        get("/api/v1/raid-logs?startDate=2024-06-09&endDate=2024-06-10", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&listed),
        vec![late_on_end_day.to_string(), before.to_string()]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_paging_past_the_offset_range_is_rejected(pool: PgPool) {
    let (status, body) = send(
        build_test_app(pool),
        get("/api/v1/raid-logs?page=9223372036854775807", None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("page"));
}
