//! Raid log listing and creation.
//!
//! Listing turns query parameters and the caller's session into a
//! [`WhereClause`] over `log_entries`, enforcing who may see which rows:
//!
//! | target user      | caller            | visible rows                        |
//! |------------------|-------------------|-------------------------------------|
//! | caller           | authenticated     | all of the caller's rows            |
//! | someone else     | any               | target's public, non-anonymous rows |
//! | none             | authenticated     | public non-anonymous OR own rows    |
//! | none             | anonymous         | public non-anonymous rows           |
//! | none, `isPrivate`| authenticated     | own private rows only               |
//!
//! Creation upserts the day's regional forecast, inserts the log entry and,
//! when requested, its alert, all in one transaction.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::collections::{HashMap, HashSet};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::SessionUser;
use crate::db::models::{AlertLink, Forecast, LogEntry, Region, UserSummary};
use crate::db::queries::{
    self, InsertAlertParams, InsertLogEntryParams, SqlValue, UpsertForecastParams, WhereClause,
};
use crate::errors::AppError;
use crate::helpers::{dec_to_f64, degrees_to_cardinal, f64_to_decimal_1dp, split_csv};
use crate::services::beach_filter::Beach;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;
pub const MIN_RATING: i32 = 0;
pub const MAX_RATING: i32 = 5;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_ALERT_TYPE: &str = "variables";

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Raw query parameters of `GET /api/v1/raid-logs`.
///
/// Values are taken as strings and validated by [`LogQuery::parse`] so that
/// malformed input yields a JSON 400.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LogQueryParams {
    /// Comma-separated beach names
    pub beaches: Option<String>,
    /// Comma-separated region UUIDs
    pub regions: Option<String>,
    /// Comma-separated country names
    pub countries: Option<String>,
    /// Minimum surfer rating (0-5, default 0)
    pub min_rating: Option<String>,
    /// Maximum surfer rating (0-5, default 5)
    pub max_rating: Option<String>,
    /// First day to include (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Last day to include (YYYY-MM-DD, inclusive)
    pub end_date: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<String>,
    /// Page size (default 50, max 200)
    pub limit: Option<String>,
    /// "true" to list only the caller's private logs
    pub is_private: Option<String>,
    /// Only list logs of this user
    pub user_id: Option<String>,
}

/// Validated listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    pub beach_names: Vec<String>,
    pub region_ids: Vec<Uuid>,
    pub countries: Vec<String>,
    pub min_rating: i32,
    pub max_rating: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: i64,
    pub limit: i64,
    pub private_only: bool,
    pub target_user: Option<Uuid>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            beach_names: Vec::new(),
            region_ids: Vec::new(),
            countries: Vec::new(),
            min_rating: MIN_RATING,
            max_rating: MAX_RATING,
            start_date: None,
            end_date: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            private_only: false,
            target_user: None,
        }
    }
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(name: &str, raw: &Option<String>) -> Result<Option<NaiveDate>, AppError> {
    non_empty(raw)
        .map(|s| {
            NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
                AppError::BadRequest(format!("{} must be a date in YYYY-MM-DD format", name))
            })
        })
        .transpose()
}

fn parse_rating(name: &str, raw: &Option<String>, default: i32) -> Result<i32, AppError> {
    let Some(s) = non_empty(raw) else {
        return Ok(default);
    };
    let rating: i32 = s
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name)))?;
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::BadRequest(format!(
            "{} must be between {} and {}",
            name, MIN_RATING, MAX_RATING
        )));
    }
    Ok(rating)
}

/// Parse a positive paging value; missing or non-positive values fall back to
/// `default`.
fn parse_positive(name: &str, raw: &Option<String>, default: i64) -> Result<i64, AppError> {
    let Some(s) = non_empty(raw) else {
        return Ok(default);
    };
    let value: i64 = s
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name)))?;
    Ok(if value < 1 { default } else { value })
}

fn parse_uuid(name: &str, s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s).map_err(|_| AppError::BadRequest(format!("{} must be a valid UUID", name)))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl LogQuery {
    pub fn parse(params: &LogQueryParams) -> Result<Self, AppError> {
        let min_rating = parse_rating("minRating", &params.min_rating, MIN_RATING)?;
        let max_rating = parse_rating("maxRating", &params.max_rating, MAX_RATING)?;
        if min_rating > max_rating {
            return Err(AppError::BadRequest(
                "minRating must not exceed maxRating".to_string(),
            ));
        }

        let start_date = parse_date("startDate", &params.start_date)?;
        let end_date = parse_date("endDate", &params.end_date)?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::BadRequest(
                    "startDate must not be after endDate".to_string(),
                ));
            }
        }

        let region_ids = split_csv(params.regions.as_deref())
            .iter()
            .map(|s| parse_uuid("regions", s))
            .collect::<Result<Vec<_>, _>>()?;

        let target_user = non_empty(&params.user_id)
            .map(|s| parse_uuid("userId", s))
            .transpose()?;

        let page = parse_positive("page", &params.page, DEFAULT_PAGE)?;
        let limit = parse_positive("limit", &params.limit, DEFAULT_LIMIT)?.min(MAX_LIMIT);
        if (page - 1).checked_mul(limit).is_none() {
            return Err(AppError::BadRequest("page is out of range".to_string()));
        }

        Ok(Self {
            beach_names: split_csv(params.beaches.as_deref()),
            region_ids,
            countries: split_csv(params.countries.as_deref()),
            min_rating,
            max_rating,
            start_date,
            end_date,
            page,
            limit,
            private_only: params.is_private.as_deref() == Some("true"),
            target_user,
        })
    }

    /// Row offset of the requested page, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit)
    }

    /// Build the full `WHERE` clause: visibility first, then the optional
    /// filters, all AND-combined.
    pub fn where_clause(&self, visibility: Visibility) -> Result<WhereClause, AppError> {
        let mut clause = WhereClause::new();
        visibility.push_sql(&mut clause);

        if !self.beach_names.is_empty() {
            let p = clause.bind(SqlValue::Texts(self.beach_names.clone()));
            clause.push(format!("b.name = ANY({p})"));
        }
        if !self.region_ids.is_empty() {
            let p = clause.bind(SqlValue::Uuids(self.region_ids.clone()));
            clause.push(format!("l.region_id = ANY({p})"));
        }
        if !self.countries.is_empty() {
            let p = clause.bind(SqlValue::Texts(self.countries.clone()));
            clause.push(format!("r.country = ANY({p})"));
        }
        if self.min_rating > MIN_RATING {
            let p = clause.bind(SqlValue::Int(self.min_rating));
            clause.push(format!("l.surfer_rating >= {p}"));
        }
        if self.max_rating < MAX_RATING {
            let p = clause.bind(SqlValue::Int(self.max_rating));
            clause.push(format!("l.surfer_rating <= {p}"));
        }
        if let Some(start) = self.start_date {
            let p = clause.bind(SqlValue::Timestamp(start_of_day(start)));
            clause.push(format!("l.date >= {p}"));
        }
        if let Some(end) = self.end_date {
            // End date is inclusive: everything before the following midnight.
            let next_day = end
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::BadRequest("endDate is out of range".to_string()))?;
            let p = clause.bind(SqlValue::Timestamp(start_of_day(next_day)));
            clause.push(format!("l.date < {p}"));
        }

        Ok(clause)
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Which log entries a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Public, non-anonymous rows of anyone.
    Public,
    /// Public, non-anonymous rows, plus every row owned by the user.
    PublicOrOwnedBy(Uuid),
    /// Every row owned by the user.
    AllOwnedBy(Uuid),
    /// Public, non-anonymous rows owned by the user.
    PublicOwnedBy(Uuid),
    /// Private rows owned by the user.
    PrivateOwnedBy(Uuid),
}

impl Visibility {
    pub fn resolve(
        target_user: Option<Uuid>,
        private_only: bool,
        caller: Option<&SessionUser>,
    ) -> Self {
        let caller_id = caller.map(|c| c.id);
        match (target_user, caller_id) {
            (Some(target), Some(me)) if target == me => Visibility::AllOwnedBy(target),
            (Some(target), _) => Visibility::PublicOwnedBy(target),
            (None, Some(me)) if private_only => Visibility::PrivateOwnedBy(me),
            (None, Some(me)) => Visibility::PublicOrOwnedBy(me),
            (None, None) => Visibility::Public,
        }
    }

    /// Whether a row with these attributes is visible.
    pub fn permits(&self, is_private: bool, is_anonymous: bool, owner: Uuid) -> bool {
        let public = !is_private && !is_anonymous;
        match *self {
            Visibility::Public => public,
            Visibility::PublicOrOwnedBy(user) => public || owner == user,
            Visibility::AllOwnedBy(user) => owner == user,
            Visibility::PublicOwnedBy(user) => public && owner == user,
            Visibility::PrivateOwnedBy(user) => is_private && owner == user,
        }
    }

    fn push_sql(&self, clause: &mut WhereClause) {
        const PUBLIC: &str = "l.is_private = FALSE AND l.is_anonymous = FALSE";
        match *self {
            Visibility::Public => clause.push(PUBLIC),
            Visibility::PublicOrOwnedBy(user) => {
                let p = clause.bind(SqlValue::Uuid(user));
                clause.push(format!("(({PUBLIC}) OR l.user_id = {p})"));
            }
            Visibility::AllOwnedBy(user) => {
                let p = clause.bind(SqlValue::Uuid(user));
                clause.push(format!("l.user_id = {p}"));
            }
            Visibility::PublicOwnedBy(user) => {
                let p = clause.bind(SqlValue::Uuid(user));
                clause.push(format!("l.user_id = {p}"));
                clause.push(PUBLIC);
            }
            Visibility::PrivateOwnedBy(user) => {
                let p = clause.bind(SqlValue::Uuid(user));
                clause.push("l.is_private = TRUE");
                clause.push(format!("l.user_id = {p}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionView {
    pub id: Uuid,
    pub name: String,
    pub continent: String,
    pub country: String,
}

impl From<Region> for RegionView {
    fn from(r: Region) -> Self {
        Self {
            id: r.id,
            name: r.name,
            continent: r.continent,
            country: r.country,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WindView {
    /// Wind speed in knots
    pub speed: f64,
    /// Wind direction in degrees
    pub direction: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwellView {
    /// Swell height in metres
    pub height: f64,
    /// Swell period in seconds
    pub period: f64,
    /// Swell direction in degrees
    pub direction: f64,
    /// 8-point compass label, e.g. "SW"
    pub cardinal_direction: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastView {
    pub id: Uuid,
    pub date: NaiveDate,
    pub region_id: Uuid,
    pub wind: WindView,
    pub swell: SwellView,
}

impl From<Forecast> for ForecastView {
    fn from(f: Forecast) -> Self {
        Self {
            id: f.id,
            date: f.date,
            region_id: f.region_id,
            wind: WindView {
                speed: dec_to_f64(f.wind_speed),
                direction: dec_to_f64(f.wind_direction),
            },
            swell: SwellView {
                height: dec_to_f64(f.swell_height),
                period: dec_to_f64(f.swell_period),
                direction: dec_to_f64(f.swell_direction),
                cardinal_direction: f.swell_cardinal_direction,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub name: Option<String>,
    pub nationality: Option<String>,
}

impl From<UserSummary> for UserView {
    fn from(u: UserSummary) -> Self {
        Self {
            id: u.id,
            name: u.name,
            nationality: u.nationality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertRef {
    pub id: Uuid,
    pub user_id: Uuid,
}

/// A log entry with its relations and alert annotations.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaidLogView {
    pub id: Uuid,
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
    pub region: Option<RegionView>,
    pub beach: Option<Beach>,
    pub forecast: Option<ForecastView>,
    pub user: Option<UserView>,
    /// Linked alerts, oldest first
    pub alerts: Vec<AlertRef>,
    pub has_alert: bool,
    /// Id of the oldest linked alert
    pub alert_id: Option<Uuid>,
    /// Whether any linked alert belongs to the caller
    pub is_my_alert: bool,
}

/// Alert-derived flags of one log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSummary {
    pub has_alert: bool,
    pub alert_id: Option<Uuid>,
    pub is_my_alert: bool,
}

/// Summarise `alerts` (ordered oldest first) for `caller`.
pub fn summarize_alerts(alerts: &[AlertLink], caller: Option<Uuid>) -> AlertSummary {
    AlertSummary {
        has_alert: !alerts.is_empty(),
        alert_id: alerts.first().map(|a| a.id),
        is_my_alert: caller.is_some_and(|me| alerts.iter().any(|a| a.user_id == me)),
    }
}

/// Related rows of a batch of log entries, keyed by id.
#[derive(Default)]
struct Relations {
    regions: HashMap<Uuid, Region>,
    beaches: HashMap<Uuid, Beach>,
    forecasts: HashMap<Uuid, Forecast>,
    users: HashMap<Uuid, UserSummary>,
}

fn unique_ids(entries: &[LogEntry], key: impl Fn(&LogEntry) -> Uuid) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .map(key)
        .filter(|id| seen.insert(*id))
        .collect()
}

impl Relations {
    async fn load(conn: &mut PgConnection, entries: &[LogEntry]) -> Result<Self, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Self::default());
        }

        let regions =
            queries::get_regions_by_ids(&mut *conn, &unique_ids(entries, |e| e.region_id)).await?;
        let beaches =
            queries::get_beaches_by_ids(&mut *conn, &unique_ids(entries, |e| e.beach_id)).await?;
        let forecasts =
            queries::get_forecasts_by_ids(&mut *conn, &unique_ids(entries, |e| e.forecast_id))
                .await?;
        let users =
            queries::get_users_by_ids(&mut *conn, &unique_ids(entries, |e| e.user_id)).await?;

        Ok(Self {
            regions: regions.into_iter().map(|r| (r.id, r)).collect(),
            beaches: beaches
                .into_iter()
                .map(|b| (b.id, Beach::from(b)))
                .collect(),
            forecasts: forecasts.into_iter().map(|f| (f.id, f)).collect(),
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        })
    }
}

fn to_view(
    entry: LogEntry,
    relations: &Relations,
    alerts: &[AlertLink],
    caller: Option<Uuid>,
) -> RaidLogView {
    let summary = summarize_alerts(alerts, caller);
    RaidLogView {
        region: relations.regions.get(&entry.region_id).cloned().map(RegionView::from),
        beach: relations.beaches.get(&entry.beach_id).cloned(),
        forecast: relations
            .forecasts
            .get(&entry.forecast_id)
            .cloned()
            .map(ForecastView::from),
        user: relations.users.get(&entry.user_id).cloned().map(UserView::from),
        alerts: alerts
            .iter()
            .map(|a| AlertRef {
                id: a.id,
                user_id: a.user_id,
            })
            .collect(),
        has_alert: summary.has_alert,
        alert_id: summary.alert_id,
        is_my_alert: summary.is_my_alert,
        id: entry.id,
        date: entry.date,
        surfer_name: entry.surfer_name,
        surfer_email: entry.surfer_email,
        surfer_rating: entry.surfer_rating,
        comments: entry.comments,
        is_private: entry.is_private,
        is_anonymous: entry.is_anonymous,
        wave_type: entry.wave_type,
        image_url: entry.image_url,
        video_url: entry.video_url,
        video_platform: entry.video_platform,
        user_id: entry.user_id,
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// List the log entries `caller` may see, newest first, one page at a time.
pub async fn list_raid_logs(
    pool: &PgPool,
    caller: Option<&SessionUser>,
    query: &LogQuery,
) -> Result<Vec<RaidLogView>, AppError> {
    let visibility = Visibility::resolve(query.target_user, query.private_only, caller);
    let clause = query.where_clause(visibility)?;
    tracing::debug!(
        "Listing raid logs where {} ({} binds), page {} limit {}",
        clause.to_sql(),
        clause.binds().len(),
        query.page,
        query.limit
    );

    let mut entries =
        queries::list_log_entries(pool, &clause, query.limit, query.offset()).await?;

    entries.retain(|e| {
        let visible = visibility.permits(e.is_private, e.is_anonymous, e.user_id);
        if !visible {
            tracing::warn!("Dropping raid log {} not visible under {:?}", e.id, visibility);
        }
        visible
    });

    let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
    let mut alerts_by_entry: HashMap<Uuid, Vec<AlertLink>> = HashMap::new();
    if !ids.is_empty() {
        for link in queries::list_alert_links(pool, &ids).await? {
            alerts_by_entry.entry(link.log_entry_id).or_default().push(link);
        }
    }

    let mut conn = pool.acquire().await?;
    let relations = Relations::load(&mut conn, &entries).await?;

    let caller_id = caller.map(|c| c.id);
    let views: Vec<RaidLogView> = entries
        .into_iter()
        .map(|entry| {
            let alerts = alerts_by_entry.remove(&entry.id).unwrap_or_default();
            to_view(entry, &relations, &alerts, caller_id)
        })
        .collect();

    tracing::info!("Found {} raid logs", views.len());
    Ok(views)
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WindInput {
    /// Wind speed in knots
    pub speed: f64,
    /// Wind direction in degrees
    pub direction: f64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwellInput {
    /// Swell height in metres
    pub height: f64,
    /// Swell period in seconds
    pub period: f64,
    /// Swell direction in degrees
    pub direction: f64,
    /// Compass label; derived from `direction` when omitted
    #[serde(default)]
    pub cardinal_direction: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForecastInput {
    pub wind: WindInput,
    pub swell: SwellInput,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfigInput {
    pub name: String,
    /// Condition properties the alert watches, e.g.
    /// `[{"property": "windSpeed", "optimalValue": 10, "range": 5}]`
    #[serde(default = "empty_properties")]
    #[schema(value_type = Object)]
    pub properties: serde_json::Value,
    /// e.g. "email", "whatsapp" or "both"
    pub notification_method: String,
    pub contact_info: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// "variables" (default) or "rating"
    #[serde(default)]
    pub alert_type: Option<String>,
    /// Star rating threshold (1-5)
    #[serde(default)]
    pub star_rating: Option<i32>,
}

fn empty_properties() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

fn default_true() -> bool {
    true
}

/// Body of `POST /api/v1/raid-logs`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewRaidLog {
    /// Session date (YYYY-MM-DD)
    pub date: String,
    pub region_id: Uuid,
    pub beach_id: Uuid,
    pub surfer_name: String,
    /// 0-5
    pub surfer_rating: i32,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub wave_type: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_platform: Option<String>,
    pub forecast: ForecastInput,
    #[serde(default)]
    pub create_alert: bool,
    #[serde(default)]
    pub alert_config: Option<AlertConfigInput>,
}

fn require_measure(name: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::BadRequest(format!(
            "{} must be a finite, non-negative number",
            name
        )));
    }
    Ok(())
}

impl NewRaidLog {
    /// Check the submission and return its session date.
    pub fn validate(&self) -> Result<NaiveDate, AppError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            AppError::BadRequest("date must be a date in YYYY-MM-DD format".to_string())
        })?;

        if self.surfer_name.trim().is_empty() {
            return Err(AppError::BadRequest("surferName is required".to_string()));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.surfer_rating) {
            return Err(AppError::BadRequest(format!(
                "surferRating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let f = &self.forecast;
        require_measure("forecast.wind.speed", f.wind.speed)?;
        require_measure("forecast.wind.direction", f.wind.direction)?;
        require_measure("forecast.swell.height", f.swell.height)?;
        require_measure("forecast.swell.period", f.swell.period)?;
        require_measure("forecast.swell.direction", f.swell.direction)?;

        if self.create_alert {
            let config = self.alert_config.as_ref().ok_or_else(|| {
                AppError::BadRequest("alertConfig is required when createAlert is true".to_string())
            })?;
            if config.name.trim().is_empty() {
                return Err(AppError::BadRequest("alertConfig.name is required".to_string()));
            }
            if config.notification_method.trim().is_empty()
                || config.contact_info.trim().is_empty()
            {
                return Err(AppError::BadRequest(
                    "alertConfig.notificationMethod and alertConfig.contactInfo are required"
                        .to_string(),
                ));
            }
            if let Some(stars) = config.star_rating {
                if !(1..=MAX_RATING).contains(&stars) {
                    return Err(AppError::BadRequest(format!(
                        "alertConfig.starRating must be between 1 and {}",
                        MAX_RATING
                    )));
                }
            }
        }

        Ok(date)
    }

    fn swell_cardinal(&self) -> String {
        self.forecast
            .swell
            .cardinal_direction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| degrees_to_cardinal(self.forecast.swell.direction).to_string())
    }
}

/// Create a log entry (and optionally its alert) for `user`.
///
/// The forecast for (date, region) is created if absent and reused untouched
/// otherwise. Everything runs in one transaction: on any error nothing is
/// persisted.
pub async fn create_raid_log(
    pool: &PgPool,
    user: &SessionUser,
    input: NewRaidLog,
) -> Result<RaidLogView, AppError> {
    let date = input.validate()?;

    let mut tx = pool.begin().await?;

    let forecast = queries::upsert_forecast(
        &mut tx,
        UpsertForecastParams {
            date,
            region_id: input.region_id,
            wind_speed: f64_to_decimal_1dp(input.forecast.wind.speed),
            wind_direction: f64_to_decimal_1dp(input.forecast.wind.direction),
            swell_height: f64_to_decimal_1dp(input.forecast.swell.height),
            swell_period: f64_to_decimal_1dp(input.forecast.swell.period),
            swell_direction: f64_to_decimal_1dp(input.forecast.swell.direction),
            swell_cardinal_direction: Some(input.swell_cardinal()),
        },
    )
    .await?;

    let entry = queries::insert_log_entry(
        &mut tx,
        InsertLogEntryParams {
            date: start_of_day(date),
            surfer_name: input.surfer_name.trim().to_string(),
            surfer_email: user.email.clone(),
            surfer_rating: input.surfer_rating,
            comments: input.comments.clone(),
            is_private: input.is_private,
            is_anonymous: input.is_anonymous,
            wave_type: input.wave_type.clone(),
            image_url: input.image_url.clone(),
            video_url: input.video_url.clone(),
            video_platform: input.video_platform.clone(),
            user_id: user.id,
            region_id: input.region_id,
            beach_id: input.beach_id,
            forecast_id: forecast.id,
        },
    )
    .await?;

    let mut alerts = Vec::new();
    if input.create_alert {
        if let Some(config) = input.alert_config {
            let alert = queries::insert_alert(
                &mut tx,
                InsertAlertParams {
                    name: config.name.trim().to_string(),
                    user_id: user.id,
                    region_id: input.region_id,
                    forecast_id: forecast.id,
                    log_entry_id: entry.id,
                    forecast_date: forecast.date,
                    properties: config.properties,
                    notification_method: config.notification_method,
                    contact_info: config.contact_info,
                    active: config.active,
                    alert_type: config
                        .alert_type
                        .unwrap_or_else(|| DEFAULT_ALERT_TYPE.to_string()),
                    star_rating: config.star_rating,
                },
            )
            .await?;
            tracing::info!("Created alert {} for raid log {}", alert.id, entry.id);
            alerts.push(AlertLink {
                id: alert.id,
                log_entry_id: alert.log_entry_id,
                user_id: alert.user_id,
            });
        }
    }

    let relations = Relations::load(&mut tx, std::slice::from_ref(&entry)).await?;
    tx.commit().await?;

    tracing::info!(
        "Created raid log {} for user {} (forecast {})",
        entry.id,
        user.id,
        forecast.id
    );
    Ok(to_view(entry, &relations, &alerts, Some(user.id)))
}
