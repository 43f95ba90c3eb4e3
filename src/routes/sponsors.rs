use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{models, queries};
use crate::errors::AppError;

/// A sponsor shown in the forecast widget.
#[derive(Debug, Serialize, ToSchema)]
pub struct SponsorResponse {
    pub id: Uuid,
    pub name: String,
    /// Logo image URL
    pub logo: String,
    /// Sponsor landing page
    pub link: String,
}

impl From<models::Sponsor> for SponsorResponse {
    fn from(s: models::Sponsor) -> Self {
        Self {
            id: s.id,
            name: s.name,
            logo: s.logo,
            link: s.link,
        }
    }
}

/// List active sponsors in display order.
#[utoipa::path(
    get,
    path = "/api/v1/sponsors",
    tag = "Sponsors",
    responses(
        (status = 200, description = "Active sponsors", body = Vec<SponsorResponse>),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_sponsors(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<SponsorResponse>>, AppError> {
    let sponsors = queries::list_sponsors(&pool).await?;
    Ok(Json(
        sponsors.into_iter().map(SponsorResponse::from).collect(),
    ))
}
