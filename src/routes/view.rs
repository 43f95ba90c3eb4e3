//! Beach view endpoints.
//!
//! Read and replace the parts of the caller's view state, and serve the
//! filtered, scored beach list derived from it. Signed-in callers are keyed
//! by their session; anonymous browsers send a random id in the
//! `X-View-Session` header.

use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use utoipa::ToSchema;
use uuid::Uuid;

use super::AppState;
use crate::auth::SessionUser;
use crate::db::queries;
use crate::errors::{AppError, ErrorResponse};
use crate::services::beach_filter::{
    paginate, sort_beaches, Beach, BeachScore, BeachSort, BeachWithScore, FilterCriteria,
    ScoreMap,
};
use crate::services::view_state::{
    GoodBeach, LoadingDomain, LoadingStates, RegionConditions, ViewKey, ViewState,
};

/// Beaches per page of the beach list.
const BEACHES_PER_PAGE: usize = 18;

/// Header carrying an anonymous browser's view session id.
pub const VIEW_SESSION_HEADER: &str = "x-view-session";

#[axum::async_trait]
impl FromRequestParts<AppState> for ViewKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.contains_key(AUTHORIZATION) {
            let user = SessionUser::from_request_parts(parts, state).await?;
            return Ok(ViewKey::User(user.id));
        }

        let raw = parts
            .headers
            .get(VIEW_SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "A bearer session or the {} header is required",
                    VIEW_SESSION_HEADER
                ))
            })?;
        Uuid::parse_str(raw.trim())
            .map(ViewKey::Client)
            .map_err(|_| AppError::BadRequest(format!("{} must be a UUID", VIEW_SESSION_HEADER)))
    }
}

/// Snapshot of one session's view state.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub beaches: Vec<Beach>,
    pub filters: FilterCriteria,
    #[schema(value_type = HashMap<String, BeachScore>)]
    pub beach_scores: ScoreMap,
    pub forecast_data: Option<RegionConditions>,
    pub today_good_beaches: Vec<GoodBeach>,
    pub sort: BeachSort,
    pub current_page: u32,
    pub is_loading: bool,
    pub loading_states: LoadingStates,
}

impl From<&ViewState> for ViewSnapshot {
    fn from(state: &ViewState) -> Self {
        Self {
            beaches: state.beaches().to_vec(),
            filters: state.filters().clone(),
            beach_scores: state.beach_scores().clone(),
            forecast_data: state.forecast_data().cloned(),
            today_good_beaches: state.today_good_beaches().to_vec(),
            sort: state.sort(),
            current_page: state.current_page(),
            is_loading: state.is_loading(),
            loading_states: state.loading_states(),
        }
    }
}

/// One page of the filtered beach list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BeachPage {
    pub beaches: Vec<BeachWithScore>,
    /// Number of beaches passing the filters
    pub total: usize,
    pub page: u32,
    pub per_page: usize,
    pub sort: BeachSort,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageUpdate {
    /// 1-based page number
    pub page: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoadingUpdate {
    /// Domain to flag; omit to set the global loading flag
    #[serde(default)]
    pub domain: Option<LoadingDomain>,
    pub loading: bool,
}

/// Apply `update` to the caller's view and snapshot the result.
async fn update_view(
    state: &AppState,
    key: ViewKey,
    update: impl FnOnce(&mut ViewState),
) -> ViewSnapshot {
    let mut registry = state.views.write().await;
    let view = registry.view_mut(key, Instant::now());
    update(&mut *view);
    ViewSnapshot::from(&*view)
}

/// Get the caller's view state.
#[utoipa::path(
    get,
    path = "/api/v1/view",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    responses(
        (status = 200, description = "Current view state", body = ViewSnapshot),
        (status = 400, description = "No session to key the view by", body = ErrorResponse),
    )
)]
pub async fn get_view(State(state): State<AppState>, key: ViewKey) -> Json<ViewSnapshot> {
    Json(update_view(&state, key, |_| {}).await)
}

/// Get the current page of filtered, scored and sorted beaches.
#[utoipa::path(
    get,
    path = "/api/v1/view/beaches",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    responses(
        (status = 200, description = "Filtered beaches", body = BeachPage),
        (status = 400, description = "No session to key the view by", body = ErrorResponse),
    )
)]
pub async fn get_view_beaches(State(state): State<AppState>, key: ViewKey) -> Json<BeachPage> {
    let mut registry = state.views.write().await;
    let view = registry.view_mut(key, Instant::now());
    let sort = view.sort();
    let page = view.current_page();

    let mut filtered = view.filtered_beaches();
    sort_beaches(&mut filtered, sort);

    Json(BeachPage {
        total: filtered.len(),
        beaches: paginate(&filtered, page, BEACHES_PER_PAGE).to_vec(),
        page,
        per_page: BEACHES_PER_PAGE,
        sort,
    })
}

/// Replace the filter criteria and return to the first page.
#[utoipa::path(
    put,
    path = "/api/v1/view/filters",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    request_body = FilterCriteria,
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
    )
)]
pub async fn set_filters(
    State(state): State<AppState>,
    key: ViewKey,
    Json(filters): Json<FilterCriteria>,
) -> Json<ViewSnapshot> {
    Json(
        update_view(&state, key, |view| {
            view.set_filters(filters);
            view.set_current_page(1);
        })
        .await,
    )
}

/// Replace the beach score map.
#[utoipa::path(
    put,
    path = "/api/v1/view/scores",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    request_body(content = HashMap<String, BeachScore>, description = "Scores keyed by beach id"),
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
    )
)]
pub async fn set_scores(
    State(state): State<AppState>,
    key: ViewKey,
    Json(scores): Json<HashMap<Uuid, BeachScore>>,
) -> Json<ViewSnapshot> {
    Json(update_view(&state, key, |view| view.set_beach_scores(scores)).await)
}

/// Replace the sort order.
#[utoipa::path(
    put,
    path = "/api/v1/view/sort",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    request_body = BeachSort,
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
    )
)]
pub async fn set_sort(
    State(state): State<AppState>,
    key: ViewKey,
    Json(sort): Json<BeachSort>,
) -> Json<ViewSnapshot> {
    Json(update_view(&state, key, |view| view.set_sort(sort)).await)
}

/// Move to another page of the beach list.
#[utoipa::path(
    put,
    path = "/api/v1/view/page",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    request_body = PageUpdate,
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
        (status = 400, description = "Page 0 requested", body = ErrorResponse),
    )
)]
pub async fn set_page(
    State(state): State<AppState>,
    key: ViewKey,
    Json(update): Json<PageUpdate>,
) -> Result<Json<ViewSnapshot>, AppError> {
    if update.page == 0 {
        return Err(AppError::BadRequest("page starts at 1".to_string()));
    }
    Ok(Json(
        update_view(&state, key, |view| view.set_current_page(update.page)).await,
    ))
}

/// Set a loading flag.
#[utoipa::path(
    put,
    path = "/api/v1/view/loading",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    request_body = LoadingUpdate,
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
    )
)]
pub async fn set_loading(
    State(state): State<AppState>,
    key: ViewKey,
    Json(update): Json<LoadingUpdate>,
) -> Json<ViewSnapshot> {
    Json(
        update_view(&state, key, |view| match update.domain {
            Some(domain) => view.set_loading_state(domain, update.loading),
            None => view.set_is_loading(update.loading),
        })
        .await,
    )
}

/// Replace (or clear, with `null`) the conditions shown with the list.
#[utoipa::path(
    put,
    path = "/api/v1/view/forecast",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    request_body = Option<RegionConditions>,
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
    )
)]
pub async fn set_forecast(
    State(state): State<AppState>,
    key: ViewKey,
    Json(data): Json<Option<RegionConditions>>,
) -> Json<ViewSnapshot> {
    Json(update_view(&state, key, |view| view.set_forecast_data(data)).await)
}

/// Replace today's good beaches.
#[utoipa::path(
    put,
    path = "/api/v1/view/good-beaches",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    request_body = Vec<GoodBeach>,
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
    )
)]
pub async fn set_good_beaches(
    State(state): State<AppState>,
    key: ViewKey,
    Json(beaches): Json<Vec<GoodBeach>>,
) -> Json<ViewSnapshot> {
    Json(update_view(&state, key, |view| view.set_today_good_beaches(beaches)).await)
}

/// Reload the beach catalog from the database into the caller's view.
///
/// The reloaded catalog also seeds sessions created afterwards; other
/// existing sessions keep their list.
#[utoipa::path(
    post,
    path = "/api/v1/view/beaches/reload",
    tag = "Beach view",
    params(("x-view-session" = Option<Uuid>, Header, description = "Anonymous view session id")),
    responses(
        (status = 200, description = "Updated view state", body = ViewSnapshot),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn reload_beaches(
    State(state): State<AppState>,
    key: ViewKey,
) -> Result<Json<ViewSnapshot>, AppError> {
    update_view(&state, key, |view| {
        view.set_loading_state(LoadingDomain::Beaches, true)
    })
    .await;

    let loaded: Result<Vec<Beach>, sqlx::Error> = queries::list_beaches(&state.pool)
        .await
        .map(|rows| rows.into_iter().map(Beach::from).collect());

    let mut registry = state.views.write().await;
    if let Ok(beaches) = &loaded {
        registry.set_catalog(beaches.clone());
    }

    let view = registry.view_mut(key, Instant::now());
    view.set_loading_state(LoadingDomain::Beaches, false);
    let beaches = loaded?;
    tracing::info!("Reloaded {} beaches into view {:?}", beaches.len(), key);
    view.set_beaches(beaches);

    Ok(Json(ViewSnapshot::from(&*view)))
}
