//! Beach filtering and scoring.
//!
//! [`filter_beaches`] augments every beach with its score from the score map
//! and runs a fixed predicate chain over the list:
//!
//! 1. text search over beach, region and country names
//! 2. region equality
//! 3. wave type, difficulty, crime level and shark attack membership
//! 4. minimum score
//!
//! All predicates are AND-combined and the input order is preserved. The
//! function holds no state, so calling it twice with the same inputs yields
//! the same list.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::BeachRow;

/// Region details carried on a beach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BeachRegion {
    pub id: Uuid,
    pub name: String,
    pub country: Option<String>,
    pub continent: Option<String>,
}

/// Shark attack history of a beach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharkAttack {
    pub has_attack: bool,
    /// Free-form incident records, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub incidents: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Beach {
    pub id: Uuid,
    pub name: String,
    pub region: Option<BeachRegion>,
    /// e.g. "beach-break", "reef-break", "point-break"
    pub wave_type: String,
    /// e.g. "Beginner", "Intermediate", "Advanced"
    pub difficulty: String,
    /// e.g. "Low", "Medium", "High"
    pub crime_level: String,
    pub shark_attack: Option<SharkAttack>,
    /// Cosmetic tag, not used for filtering
    #[serde(default)]
    pub is_hidden_gem: Option<bool>,
}

impl From<BeachRow> for Beach {
    fn from(row: BeachRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            region: Some(BeachRegion {
                id: row.region_id,
                name: row.region_name,
                country: Some(row.country),
                continent: Some(row.continent),
            }),
            wave_type: row.wave_type,
            difficulty: row.difficulty,
            crime_level: row.crime_level,
            shark_attack: Some(SharkAttack {
                has_attack: row.shark_has_attack,
                incidents: row.shark_incidents,
            }),
            is_hidden_gem: Some(row.is_hidden_gem),
        }
    }
}

/// A beach together with its resolved score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BeachWithScore {
    #[serde(flatten)]
    pub beach: Beach,
    pub score: f64,
}

/// Score assigned to a beach by the external scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BeachScore {
    pub score: f64,
    pub region: String,
}

/// Beach id → score. May be sparse; missing beaches score 0.
pub type ScoreMap = HashMap<Uuid, BeachScore>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationFilter {
    pub region: String,
    pub region_id: String,
    pub country: String,
    pub continent: String,
}

/// Active beach filters. Always replaced as a whole, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub search_query: String,
    pub location: LocationFilter,
    pub wave_type: Vec<String>,
    pub difficulty: Vec<String>,
    pub crime_level: Vec<String>,
    /// "true" and/or "false"
    pub shark_attack: Vec<String>,
    /// Minimum score; 0 disables the threshold
    pub min_points: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Score,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Sort order of the beach list. Defaults to score, highest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BeachSort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Resolve a beach's score, defaulting to 0 when the map has no entry.
pub fn resolve_score(scores: &ScoreMap, beach_id: &Uuid) -> f64 {
    scores.get(beach_id).map(|s| s.score).unwrap_or(0.0)
}

fn matches_search(beach: &Beach, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    let contains = |s: &str| s.to_lowercase().contains(&needle);

    contains(beach.name.as_str())
        || beach.region.as_ref().is_some_and(|r| {
            contains(r.name.as_str()) || r.country.as_deref().is_some_and(contains)
        })
}

/// Empty set means "any".
fn in_set(set: &[String], value: &str) -> bool {
    set.is_empty() || set.iter().any(|v| v == value)
}

fn shark_attack_key(beach: &Beach) -> &'static str {
    match beach.shark_attack {
        Some(SharkAttack {
            has_attack: true, ..
        }) => "true",
        _ => "false",
    }
}

fn passes(beach: &BeachWithScore, criteria: &FilterCriteria) -> bool {
    let b = &beach.beach;

    if !matches_search(b, &criteria.search_query) {
        return false;
    }

    let region = &criteria.location.region;
    if !region.is_empty() && b.region.as_ref().map(|r| &r.name) != Some(region) {
        return false;
    }

    in_set(&criteria.wave_type, &b.wave_type)
        && in_set(&criteria.difficulty, &b.difficulty)
        && in_set(&criteria.crime_level, &b.crime_level)
        && in_set(&criteria.shark_attack, shark_attack_key(b))
        && (criteria.min_points <= 0.0 || beach.score >= criteria.min_points)
}

/// Score and filter `beaches` against `criteria`, preserving input order.
pub fn filter_beaches(
    beaches: &[Beach],
    criteria: &FilterCriteria,
    scores: &ScoreMap,
) -> Vec<BeachWithScore> {
    beaches
        .iter()
        .map(|beach| BeachWithScore {
            score: resolve_score(scores, &beach.id),
            beach: beach.clone(),
        })
        .filter(|beach| passes(beach, criteria))
        .collect()
}

/// Stable sort by the configured field and direction.
pub fn sort_beaches(beaches: &mut [BeachWithScore], sort: BeachSort) {
    beaches.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Score => a.score.total_cmp(&b.score),
            SortField::Name => a.beach.name.to_lowercase().cmp(&b.beach.name.to_lowercase()),
        };
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// The 1-based `page` of `items`. Page 0 is treated as page 1; pages past the
/// end are empty.
pub fn paginate<T>(items: &[T], page: u32, per_page: usize) -> &[T] {
    let start = (page.max(1) as usize - 1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}
