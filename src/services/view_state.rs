//! Per-session view state for the beach browser.
//!
//! Each browser session owns a [`ViewState`]: the beach catalog, the active
//! filters, the score map, sort order, page cursor and loading flags. The
//! store only stores: every setter replaces its field as a whole, and derived
//! data comes from [`filter_beaches`].
//!
//! Sessions live in a [`ViewRegistry`] keyed by [`ViewKey`], shared as
//! [`SharedViewRegistry`]. A request runs under one write guard, so readers
//! never observe a half-applied update. Idle sessions are evicted after
//! [`SESSION_IDLE_TTL`]; when [`MAX_SESSIONS`] is reached the least recently
//! used session makes room.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::beach_filter::{
    filter_beaches, Beach, BeachSort, BeachWithScore, FilterCriteria, ScoreMap,
};

/// How long a session's view survives without requests.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
/// Upper bound on concurrently held session views.
pub const MAX_SESSIONS: usize = 10_000;

/// Thread-safe shared registry of session views.
pub type SharedViewRegistry = Arc<RwLock<ViewRegistry>>;

/// Wind/swell conditions currently shown alongside the beach list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionConditions {
    pub region_id: Uuid,
    pub date: NaiveDate,
    /// Wind speed in knots
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: f64,
    /// Swell height in metres
    pub swell_height: f64,
    /// Swell period in seconds
    pub swell_period: f64,
    /// Swell direction in degrees
    pub swell_direction: f64,
}

/// A beach flagged as good today by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoodBeach {
    pub beach_id: Uuid,
    pub region: String,
    pub score: f64,
}

/// Data domains with their own loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoadingDomain {
    Forecast,
    Beaches,
    Scores,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoadingStates {
    pub forecast: bool,
    pub beaches: bool,
    pub scores: bool,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    beaches: Vec<Beach>,
    filters: FilterCriteria,
    beach_scores: ScoreMap,
    forecast_data: Option<RegionConditions>,
    today_good_beaches: Vec<GoodBeach>,
    sort: BeachSort,
    current_page: u32,
    is_loading: bool,
    loading_states: LoadingStates,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ViewState {
    pub fn new(beaches: Vec<Beach>) -> Self {
        Self {
            beaches,
            filters: FilterCriteria::default(),
            beach_scores: HashMap::new(),
            forecast_data: None,
            today_good_beaches: Vec::new(),
            sort: BeachSort::default(),
            current_page: 1,
            is_loading: false,
            loading_states: LoadingStates::default(),
        }
    }

    pub fn beaches(&self) -> &[Beach] {
        &self.beaches
    }

    pub fn set_beaches(&mut self, beaches: Vec<Beach>) {
        self.beaches = beaches;
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
    }

    pub fn beach_scores(&self) -> &ScoreMap {
        &self.beach_scores
    }

    pub fn set_beach_scores(&mut self, scores: ScoreMap) {
        tracing::debug!("Replacing beach scores ({} entries)", scores.len());
        self.beach_scores = scores;
    }

    pub fn forecast_data(&self) -> Option<&RegionConditions> {
        self.forecast_data.as_ref()
    }

    pub fn set_forecast_data(&mut self, data: Option<RegionConditions>) {
        self.forecast_data = data;
    }

    pub fn today_good_beaches(&self) -> &[GoodBeach] {
        &self.today_good_beaches
    }

    pub fn set_today_good_beaches(&mut self, beaches: Vec<GoodBeach>) {
        self.today_good_beaches = beaches;
    }

    pub fn sort(&self) -> BeachSort {
        self.sort
    }

    pub fn set_sort(&mut self, sort: BeachSort) {
        self.sort = sort;
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page;
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_is_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn loading_states(&self) -> LoadingStates {
        self.loading_states
    }

    /// Set one domain's loading flag, leaving the others untouched.
    pub fn set_loading_state(&mut self, domain: LoadingDomain, loading: bool) {
        match domain {
            LoadingDomain::Forecast => self.loading_states.forecast = loading,
            LoadingDomain::Beaches => self.loading_states.beaches = loading,
            LoadingDomain::Scores => self.loading_states.scores = loading,
        }
    }

    /// The beach list filtered by the current criteria, with scores resolved.
    pub fn filtered_beaches(&self) -> Vec<BeachWithScore> {
        filter_beaches(&self.beaches, &self.filters, &self.beach_scores)
    }
}

/// Identifies the session a view belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// A signed-in surfer; all of their clients share one view.
    User(Uuid),
    /// An anonymous browser session, identified by a client-generated id.
    Client(Uuid),
}

#[derive(Debug)]
struct SessionView {
    view: ViewState,
    last_seen: Instant,
}

/// Session views plus the beach catalog new sessions start from.
#[derive(Debug)]
pub struct ViewRegistry {
    catalog: Vec<Beach>,
    sessions: HashMap<ViewKey, SessionView>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ViewRegistry {
    pub fn new(catalog: Vec<Beach>) -> Self {
        Self::with_limits(catalog, SESSION_IDLE_TTL, MAX_SESSIONS)
    }

    pub fn with_limits(catalog: Vec<Beach>, idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            catalog,
            sessions: HashMap::new(),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// The catalog new sessions are seeded with.
    pub fn catalog(&self) -> &[Beach] {
        &self.catalog
    }

    /// Replace the seed catalog. Existing sessions keep their own list.
    pub fn set_catalog(&mut self, beaches: Vec<Beach>) {
        self.catalog = beaches;
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The view of `key`, created from the catalog on first use.
    ///
    /// Marks the session as seen at `now` and evicts sessions idle for
    /// longer than the TTL.
    pub fn view_mut(&mut self, key: ViewKey, now: Instant) -> &mut ViewState {
        self.evict_idle(now);

        if !self.sessions.contains_key(&key) && self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(k, _)| *k);
            if let Some(oldest) = oldest {
                tracing::debug!("Evicting least recently used view {:?}", oldest);
                self.sessions.remove(&oldest);
            }
        }

        let catalog = &self.catalog;
        let session = self.sessions.entry(key).or_insert_with(|| SessionView {
            view: ViewState::new(catalog.clone()),
            last_seen: now,
        });
        session.last_seen = now;
        &mut session.view
    }

    /// Drop sessions not seen within the idle TTL.
    pub fn evict_idle(&mut self, now: Instant) {
        let ttl = self.idle_ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| now.saturating_duration_since(s.last_seen) <= ttl);
        let evicted = before - self.sessions.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} idle views", evicted);
        }
    }
}
