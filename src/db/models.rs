use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// A surf region (e.g. "Bukit Peninsula" in Indonesia, Asia).
#[derive(Debug, Clone, FromRow)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub continent: String,
}

/// A beach joined with its region, as loaded into the beach view.
#[derive(Debug, Clone, FromRow)]
pub struct BeachRow {
    pub id: Uuid,
    pub name: String,
    pub region_id: Uuid,
    pub region_name: String,
    pub country: String,
    pub continent: String,
    pub wave_type: String,
    pub difficulty: String,
    pub crime_level: String,
    pub shark_has_attack: bool,
    pub shark_incidents: Option<serde_json::Value>,
    pub is_hidden_gem: bool,
}

/// Public profile fields of a log entry's author.
#[derive(Debug, Clone, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub nationality: Option<String>,
}

/// Wind/swell snapshot for a region on a calendar day. Unique per (date, region).
#[derive(Debug, Clone, FromRow)]
pub struct Forecast {
    pub id: Uuid,
    pub date: NaiveDate,
    pub region_id: Uuid,
    pub wind_speed: Decimal,
    pub wind_direction: Decimal,
    pub swell_height: Decimal,
    pub swell_period: Decimal,
    pub swell_direction: Decimal,
    pub swell_cardinal_direction: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A surf session ("raid log").
#[derive(Debug, Clone, FromRow)]
pub struct LogEntry {
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
    pub region_id: Uuid,
    pub beach_id: Uuid,
    pub forecast_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The minimal alert projection needed to annotate log entries.
#[derive(Debug, Clone, FromRow)]
pub struct AlertLink {
    pub id: Uuid,
    pub log_entry_id: Uuid,
    pub user_id: Uuid,
}

/// A notification rule attached to a log entry and its forecast.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; region/forecast ids are only written
pub struct Alert {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

/// A sponsor shown in the forecast widget carousel.
#[derive(Debug, Clone, FromRow)]
pub struct Sponsor {
    pub id: Uuid,
    pub name: String,
    pub logo: String,
    pub link: String,
}
