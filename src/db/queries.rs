use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::models::{
    Alert, AlertLink, BeachRow, Forecast, LogEntry, Region, Sponsor, UserSummary,
};

const LOG_ENTRY_COLUMNS: &str = "l.id, l.date, l.surfer_name, l.surfer_email, l.surfer_rating, \
    l.comments, l.is_private, l.is_anonymous, l.wave_type, l.image_url, l.video_url, \
    l.video_platform, l.user_id, l.region_id, l.beach_id, l.forecast_id, l.created_at";

/// Same columns without the table alias, for `RETURNING`.
const LOG_ENTRY_RETURNING: &str = "id, date, surfer_name, surfer_email, surfer_rating, \
    comments, is_private, is_anonymous, wave_type, image_url, video_url, \
    video_platform, user_id, region_id, beach_id, forecast_id, created_at";

const FORECAST_COLUMNS: &str = "id, date, region_id, wind_speed, wind_direction, swell_height, \
    swell_period, swell_direction, swell_cardinal_direction, created_at";

const ALERT_COLUMNS: &str = "id, name, user_id, region_id, forecast_id, log_entry_id, \
    forecast_date, properties, notification_method, contact_info, active, alert_type, \
    star_rating, created_at";

const BEACH_COLUMNS: &str = "b.id, b.name, b.region_id, r.name AS region_name, r.country, \
    r.continent, b.wave_type, b.difficulty, b.crime_level, b.shark_has_attack, \
    b.shark_incidents, b.is_hidden_gem";

/// A value bound to a positional placeholder of a dynamically built query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Uuid),
    Uuids(Vec<Uuid>),
    Texts(Vec<String>),
    Int(i32),
    Timestamp(DateTime<Utc>),
}

/// A `WHERE` clause over `log_entries l` (joined with `beaches b` and
/// `regions r`) together with its bind values, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    conditions: Vec<String>,
    binds: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bind value and return its placeholder (`$1`, `$2`, ...).
    pub fn bind(&mut self, value: SqlValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    /// Append a condition, AND-combined with the existing ones.
    pub fn push(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    #[cfg(test)]
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn binds(&self) -> &[SqlValue] {
        &self.binds
    }

    /// Render the conditions as a single SQL expression.
    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }
}

/// Parameters for creating a forecast snapshot.
pub struct UpsertForecastParams {
    pub date: NaiveDate,
    pub region_id: Uuid,
    pub wind_speed: Decimal,
    pub wind_direction: Decimal,
    pub swell_height: Decimal,
    pub swell_period: Decimal,
    pub swell_direction: Decimal,
    pub swell_cardinal_direction: Option<String>,
}

/// Parameters for inserting a new log entry.
pub struct InsertLogEntryParams {
    pub date: DateTime<Utc>,
    pub surfer_name: String,
    pub surfer_email: Option<String>,
    pub surfer_rating: i32,
    pub comments: Option<String>,
    pub is_private: bool,
    pub is_anonymous: bool,
    pub wave_type: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub video_platform: Option<String>,
    pub user_id: Uuid,
    pub region_id: Uuid,
    pub beach_id: Uuid,
    pub forecast_id: Uuid,
}

/// Parameters for inserting a new alert.
pub struct InsertAlertParams {
    pub name: String,
    pub user_id: Uuid,
    pub region_id: Uuid,
    pub forecast_id: Uuid,
    pub log_entry_id: Uuid,
    pub forecast_date: NaiveDate,
    pub properties: serde_json::Value,
    pub notification_method: String,
    pub contact_info: String,
    pub active: bool,
    pub alert_type: String,
    pub star_rating: Option<i32>,
}

/// List log entries matching `filter`, newest first.
pub async fn list_log_entries(
    pool: &PgPool,
    filter: &WhereClause,
    limit: i64,
    offset: i64,
) -> Result<Vec<LogEntry>, sqlx::Error> {
    let n = filter.binds().len();
    let sql = format!(
        "SELECT {LOG_ENTRY_COLUMNS}
         FROM log_entries l
         JOIN beaches b ON b.id = l.beach_id
         JOIN regions r ON r.id = l.region_id
         WHERE {}
         ORDER BY l.date DESC, l.id
         LIMIT ${} OFFSET ${}",
        filter.to_sql(),
        n + 1,
        n + 2,
    );

    let mut query = sqlx::query_as::<_, LogEntry>(&sql);
    for value in filter.binds() {
        query = match value {
            SqlValue::Uuid(v) => query.bind(*v),
            SqlValue::Uuids(v) => query.bind(v.clone()),
            SqlValue::Texts(v) => query.bind(v.clone()),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }

    query.bind(limit).bind(offset).fetch_all(pool).await
}

/// Alerts linked to any of `log_entry_ids`, oldest first per entry.
pub async fn list_alert_links(
    pool: &PgPool,
    log_entry_ids: &[Uuid],
) -> Result<Vec<AlertLink>, sqlx::Error> {
    sqlx::query_as::<_, AlertLink>(
        "SELECT id, log_entry_id, user_id
         FROM alerts
         WHERE log_entry_id = ANY($1)
         ORDER BY created_at, id",
    )
    .bind(log_entry_ids)
    .fetch_all(pool)
    .await
}

pub async fn get_regions_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> Result<Vec<Region>, sqlx::Error> {
    sqlx::query_as::<_, Region>(
        "SELECT id, name, country, continent FROM regions WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

pub async fn get_beaches_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> Result<Vec<BeachRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {BEACH_COLUMNS}
         FROM beaches b
         JOIN regions r ON r.id = b.region_id
         WHERE b.id = ANY($1)"
    );
    sqlx::query_as::<_, BeachRow>(&sql)
        .bind(ids)
        .fetch_all(executor)
        .await
}

pub async fn get_forecasts_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> Result<Vec<Forecast>, sqlx::Error> {
    let sql = format!("SELECT {FORECAST_COLUMNS} FROM forecasts WHERE id = ANY($1)");
    sqlx::query_as::<_, Forecast>(&sql)
        .bind(ids)
        .fetch_all(executor)
        .await
}

pub async fn get_users_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, nationality FROM users WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

/// Create the forecast for (date, region) if absent, otherwise return the
/// existing row unmodified. Uniqueness is enforced by the
/// `forecasts_date_region_key` constraint.
pub async fn upsert_forecast(
    conn: &mut PgConnection,
    params: UpsertForecastParams,
) -> Result<Forecast, sqlx::Error> {
    let sql = format!(
        "INSERT INTO forecasts (
            id, date, region_id, wind_speed, wind_direction,
            swell_height, swell_period, swell_direction, swell_cardinal_direction, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        ON CONFLICT (date, region_id) DO UPDATE SET date = forecasts.date
        RETURNING {FORECAST_COLUMNS}"
    );
    sqlx::query_as::<_, Forecast>(&sql)
        .bind(Uuid::new_v4())
        .bind(params.date)
        .bind(params.region_id)
        .bind(params.wind_speed)
        .bind(params.wind_direction)
        .bind(params.swell_height)
        .bind(params.swell_period)
        .bind(params.swell_direction)
        .bind(params.swell_cardinal_direction)
        .fetch_one(conn)
        .await
}

/// Insert a new log entry.
pub async fn insert_log_entry(
    conn: &mut PgConnection,
    params: InsertLogEntryParams,
) -> Result<LogEntry, sqlx::Error> {
    let sql = format!(
        "INSERT INTO log_entries (
            id, date, surfer_name, surfer_email, surfer_rating, comments,
            is_private, is_anonymous, wave_type, image_url, video_url, video_platform,
            user_id, region_id, beach_id, forecast_id, created_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW()
        )
        RETURNING {LOG_ENTRY_RETURNING}"
    );
    sqlx::query_as::<_, LogEntry>(&sql)
        .bind(Uuid::new_v4())
        .bind(params.date)
        .bind(&params.surfer_name)
        .bind(&params.surfer_email)
        .bind(params.surfer_rating)
        .bind(&params.comments)
        .bind(params.is_private)
        .bind(params.is_anonymous)
        .bind(&params.wave_type)
        .bind(&params.image_url)
        .bind(&params.video_url)
        .bind(&params.video_platform)
        .bind(params.user_id)
        .bind(params.region_id)
        .bind(params.beach_id)
        .bind(params.forecast_id)
        .fetch_one(conn)
        .await
}

/// Insert a new alert.
pub async fn insert_alert(
    conn: &mut PgConnection,
    params: InsertAlertParams,
) -> Result<Alert, sqlx::Error> {
    let sql = format!(
        "INSERT INTO alerts (
            id, name, user_id, region_id, forecast_id, log_entry_id, forecast_date,
            properties, notification_method, contact_info, active, alert_type,
            star_rating, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW())
        RETURNING {ALERT_COLUMNS}"
    );
    sqlx::query_as::<_, Alert>(&sql)
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(params.user_id)
        .bind(params.region_id)
        .bind(params.forecast_id)
        .bind(params.log_entry_id)
        .bind(params.forecast_date)
        .bind(&params.properties)
        .bind(&params.notification_method)
        .bind(&params.contact_info)
        .bind(params.active)
        .bind(&params.alert_type)
        .bind(params.star_rating)
        .fetch_one(conn)
        .await
}

/// List the full beach catalog with region details, ordered by name.
pub async fn list_beaches(pool: &PgPool) -> Result<Vec<BeachRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {BEACH_COLUMNS}
         FROM beaches b
         JOIN regions r ON r.id = b.region_id
         ORDER BY b.name"
    );
    sqlx::query_as::<_, BeachRow>(&sql).fetch_all(pool).await
}

/// List active sponsors in display order.
pub async fn list_sponsors(pool: &PgPool) -> Result<Vec<Sponsor>, sqlx::Error> {
    sqlx::query_as::<_, Sponsor>(
        "SELECT id, name, logo, link FROM sponsors WHERE active ORDER BY sort_order, name",
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_placeholders_follow_bind_order() {
        let mut clause = WhereClause::new();
        let a = clause.bind(SqlValue::Int(3));
        let b = clause.bind(SqlValue::Texts(vec!["Uluwatu".into()]));
        clause.push(format!("l.surfer_rating >= {a}"));
        clause.push(format!("b.name = ANY({b})"));

        assert_eq!(a, "$1");
        assert_eq!(b, "$2");
        assert_eq!(
            clause.to_sql(),
            "l.surfer_rating >= $1 AND b.name = ANY($2)"
        );
        assert_eq!(clause.binds().len(), 2);
    }

    #[test]
    fn test_empty_where_clause_is_true() {
        assert_eq!(WhereClause::new().to_sql(), "TRUE");
    }

    #[test]
    fn test_log_entry_returning_matches_aliased_columns() {
        let aliased: Vec<&str> = LOG_ENTRY_COLUMNS
            .split(',')
            .map(|c| c.trim().trim_start_matches("l."))
            .collect();
        let returning: Vec<&str> = LOG_ENTRY_RETURNING.split(',').map(str::trim).collect();
        assert_eq!(aliased, returning);
    }
}
