//! Raid log HTTP endpoints.
//!
//! - GET  /api/v1/raid-logs?beaches=..&regions=..&startDate=..&endDate=..
//! - POST /api/v1/raid-logs

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;

use crate::auth::SessionUser;
use crate::errors::{AppError, ErrorResponse};
use crate::services::raid_logs::{self, LogQuery, LogQueryParams, NewRaidLog, RaidLogView};

/// List raid logs visible to the caller.
///
/// Anonymous callers only see public, non-anonymous logs. Authenticated
/// callers also see their own logs; `userId` narrows the list to one surfer
/// and `isPrivate=true` to the caller's private logs.
#[utoipa::path(
    get,
    path = "/api/v1/raid-logs",
    tag = "Raid logs",
    params(LogQueryParams),
    security((), ("bearer" = [])),
    responses(
        (status = 200, description = "Matching raid logs, newest first", body = Vec<RaidLogView>),
        (status = 400, description = "Malformed query parameter", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_raid_logs(
    State(pool): State<PgPool>,
    caller: Option<SessionUser>,
    Query(params): Query<LogQueryParams>,
) -> Result<Json<Vec<RaidLogView>>, AppError> {
    let query = LogQuery::parse(&params)?;
    let logs = raid_logs::list_raid_logs(&pool, caller.as_ref(), &query).await?;
    Ok(Json(logs))
}

/// Submit a raid log for the authenticated surfer.
///
/// Reuses the region's forecast for that day when one exists. With
/// `createAlert` set, an alert is created alongside the log; either both are
/// stored or neither is.
#[utoipa::path(
    post,
    path = "/api/v1/raid-logs",
    tag = "Raid logs",
    request_body = NewRaidLog,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created raid log", body = RaidLogView),
        (status = 400, description = "Invalid submission", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn create_raid_log(
    State(pool): State<PgPool>,
    user: SessionUser,
    Json(body): Json<NewRaidLog>,
) -> Result<(StatusCode, Json<RaidLogView>), AppError> {
    let created = raid_logs::create_raid_log(&pool, &user, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
