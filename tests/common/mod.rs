use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tower::ServiceExt;
use uuid::Uuid;

use surf_raid_api::auth::{SessionClaims, SessionVerifier};
use surf_raid_api::routes::{self, AppState};
use surf_raid_api::services::view_state::ViewRegistry;

const TEST_SECRET: &str = "integration-test-secret";

/// Build the API router over `pool`, verifying tokens from [`token_for`].
pub fn build_test_app(pool: PgPool) -> Router {
    let state = AppState {
        pool,
        views: Arc::new(RwLock::new(ViewRegistry::new(Vec::new()))),
        sessions: SessionVerifier::new(TEST_SECRET),
    };
    routes::router(state)
}

/// A session token for `user_id`, valid for an hour.
pub fn token_for(user_id: Uuid) -> String {
    let claims = SessionClaims {
        sub: user_id,
        email: Some(format!("{user_id}@surf.test")),
        exp: Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Send `request` and return the status with the JSON body (`Null` if empty).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value, token: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Ids of the rows a test builds its logs on.
pub struct Fixture {
    pub region_id: Uuid,
    pub beach_id: Uuid,
    pub user_id: Uuid,
}

/// Insert one region, one beach in it and one user.
pub async fn seed(pool: &PgPool) -> Fixture {
    let region_id = Uuid::new_v4();
    sqlx::query("INSERT INTO regions (id, name, country, continent) VALUES ($1, $2, $3, $4)")
        .bind(region_id)
        .bind("Bukit Peninsula")
        .bind("Indonesia")
        .bind("Asia")
        .execute(pool)
        .await
        .unwrap();

    let beach_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO beaches (id, name, region_id, wave_type, difficulty, crime_level)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(beach_id)
    .bind("Uluwatu")
    .bind(region_id)
    .bind("reef-break")
    .bind("advanced")
    .bind("low")
    .execute(pool)
    .await
    .unwrap();

    let user_id = insert_user(pool, "Layne").await;

    Fixture {
        region_id,
        beach_id,
        user_id,
    }
}

pub async fn insert_user(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, name, nationality) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("{id}@surf.test"))
        .bind(name)
        .bind("Australia")
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn insert_forecast(pool: &PgPool, region_id: Uuid, date: NaiveDate) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO forecasts (
            id, date, region_id, wind_speed, wind_direction,
            swell_height, swell_period, swell_direction
         ) VALUES ($1, $2, $3, 6.0, 90.0, 1.8, 12.0, 225.0)",
    )
    .bind(id)
    .bind(date)
    .bind(region_id)
    .execute(pool)
    .await
    .unwrap();
    id
}

/// Visibility flags of a directly inserted log entry.
#[derive(Clone, Copy)]
pub struct Flags {
    pub is_private: bool,
    pub is_anonymous: bool,
}

pub const PUBLIC: Flags = Flags {
    is_private: false,
    is_anonymous: false,
};

pub async fn insert_log(
    pool: &PgPool,
    fixture: &Fixture,
    user_id: Uuid,
    forecast_id: Uuid,
    date: DateTime<Utc>,
    flags: Flags,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO log_entries (
            id, date, surfer_name, surfer_rating, is_private, is_anonymous,
            user_id, region_id, beach_id, forecast_id
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(id)
    .bind(date)
    .bind("Layne")
    .bind(4)
    .bind(flags.is_private)
    .bind(flags.is_anonymous)
    .bind(user_id)
    .bind(fixture.region_id)
    .bind(fixture.beach_id)
    .bind(forecast_id)
    .execute(pool)
    .await
    .unwrap();
    id
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
