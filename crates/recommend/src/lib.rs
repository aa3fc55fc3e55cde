//! Candidate scoring and selection for whisky recommendations.
//!
//! Takes a preference profile and the catalog, filters candidates by
//! ownership and price band, ranks them by distance to the profile in a
//! shared feature space, and picks a diverse, explained top-N.

use barkeep_catalog::Catalog;
use barkeep_explain::explain;
use barkeep_features::{euclidean_distance, FeatureSpace, MinMaxScaler};
use barkeep_model::{CatalogBottle, OwnedBottleEntry, PreferenceProfile, Recommendation, Region};
use barkeep_profile::analyze_preferences;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Configuration for the recommender.
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// Number of recommendations to return
    pub count: usize,
    /// Nearest-neighbour pool size, as a multiple of `count`
    pub pool_factor: usize,
    /// Maximum picks per region or spirit type before backfill
    pub diversity_cap: usize,
    /// Price floor as a fraction of the average bottle price
    pub price_floor_ratio: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            count: 5,
            pool_factor: 3,
            diversity_cap: 2,
            price_floor_ratio: 0.5,
        }
    }
}

impl RecommendConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Allowed MSRP range for candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub floor: f64,
    /// `None` when the profile has no price data
    pub ceiling: Option<f64>,
}

impl PriceBand {
    pub fn for_profile(profile: &PreferenceProfile, floor_ratio: f64) -> Self {
        let floor = (profile.average_bottle_price * floor_ratio).max(0.0);
        let ceiling = if profile.price_ceiling > 0.0 {
            Some(profile.price_ceiling)
        } else {
            None
        };
        Self { floor, ceiling }
    }

    pub fn contains(&self, msrp: f64) -> bool {
        msrp >= self.floor && self.ceiling.map_or(true, |ceiling| msrp <= ceiling)
    }
}

/// Profile and picks from one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub profile: PreferenceProfile,
    pub recommendations: Vec<Recommendation>,
}

/// Analyze a collection and recommend from the catalog in one call.
pub fn recommend(
    collection: &[OwnedBottleEntry],
    catalog: &Catalog,
    config: &RecommendConfig,
) -> Recommendations {
    let profile = analyze_preferences(collection);
    let recommendations = generate_recommendations(&profile, collection, catalog, config);
    Recommendations {
        profile,
        recommendations,
    }
}

/// Rank, diversify and explain up to `config.count` catalog bottles.
///
/// Returns an empty list when no candidate survives filtering.
pub fn generate_recommendations(
    profile: &PreferenceProfile,
    collection: &[OwnedBottleEntry],
    catalog: &Catalog,
    config: &RecommendConfig,
) -> Vec<Recommendation> {
    select_bottles(profile, collection, catalog, config)
        .into_iter()
        .map(|bottle| Recommendation {
            explanation: explain(bottle, profile, collection),
            bottle: bottle.clone(),
        })
        .collect()
}

/// Pick bottles without attaching explanations.
pub fn select_bottles<'a>(
    profile: &PreferenceProfile,
    collection: &[OwnedBottleEntry],
    catalog: &'a Catalog,
    config: &RecommendConfig,
) -> Vec<&'a CatalogBottle> {
    if config.count == 0 {
        return Vec::new();
    }

    let candidates = filter_candidates(profile, collection, catalog, config);
    if candidates.is_empty() {
        tracing::warn!("No candidate bottles available for recommendation");
        return Vec::new();
    }

    let pool_size = config.count.saturating_mul(config.pool_factor.max(1));
    let pool = nearest_neighbors(profile, &candidates, pool_size);
    let selection = select_diverse(&pool, config.count, config.diversity_cap);

    tracing::debug!(
        candidates = candidates.len(),
        pool = pool.len(),
        selected = selection.bottles.len(),
        backfilled = selection.backfilled,
        "Selected recommendations"
    );

    selection.bottles
}

/// Drop owned bottles and those outside the price band.
fn filter_candidates<'a>(
    profile: &PreferenceProfile,
    collection: &[OwnedBottleEntry],
    catalog: &'a Catalog,
    config: &RecommendConfig,
) -> Vec<&'a CatalogBottle> {
    let owned: HashSet<u64> = collection.iter().filter_map(|e| e.release_id).collect();
    let band = PriceBand::for_profile(profile, config.price_floor_ratio);

    tracing::debug!(
        owned = owned.len(),
        floor = band.floor,
        ceiling = ?band.ceiling,
        "Filtering catalog"
    );

    catalog
        .bottles()
        .iter()
        .filter(|b| !owned.contains(&b.id))
        .filter(|b| band.contains(b.msrp))
        .collect()
}

/// The `k` candidates closest to the profile, closest first.
///
/// Ties on distance are broken by catalog id.
fn nearest_neighbors<'a>(
    profile: &PreferenceProfile,
    candidates: &[&'a CatalogBottle],
    k: usize,
) -> Vec<&'a CatalogBottle> {
    let space = FeatureSpace::from_bottles(candidates.iter().copied());
    let rows: Vec<Vec<f64>> = candidates.iter().map(|b| space.encode_bottle(b)).collect();
    let scaler = MinMaxScaler::fit(&rows);
    let target = scaler.transform(&space.project_profile(profile));

    let mut scored: Vec<(f64, &'a CatalogBottle)> = rows
        .iter()
        .zip(candidates)
        .map(|(row, bottle)| (euclidean_distance(&scaler.transform(row), &target), *bottle))
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
    scored.into_iter().take(k).map(|(_, bottle)| bottle).collect()
}

/// Outcome of the diversity pass.
#[derive(Debug)]
struct Selection<'a> {
    bottles: Vec<&'a CatalogBottle>,
    /// Picks added after the capped pass came up short
    backfilled: usize,
}

/// Walk the pool in order, capping picks per region and spirit type, then
/// backfill from the same pool if fewer than `n` were chosen.
fn select_diverse<'a>(pool: &[&'a CatalogBottle], n: usize, cap: usize) -> Selection<'a> {
    let mut bottles: Vec<&'a CatalogBottle> = Vec::with_capacity(n);
    let mut regions: HashMap<Region, usize> = HashMap::new();
    let mut spirits: HashMap<&str, usize> = HashMap::new();

    for &bottle in pool {
        if bottles.len() >= n {
            break;
        }

        let region_count = regions.get(&bottle.region).copied().unwrap_or(0);
        let spirit_count = spirits.get(bottle.spirit_type.as_str()).copied().unwrap_or(0);
        if region_count >= cap || spirit_count >= cap {
            continue;
        }

        *regions.entry(bottle.region).or_default() += 1;
        *spirits.entry(bottle.spirit_type.as_str()).or_default() += 1;
        bottles.push(bottle);
    }

    let diverse = bottles.len();
    for &bottle in pool {
        if bottles.len() >= n {
            break;
        }
        if !bottles.iter().any(|b| b.id == bottle.id) {
            bottles.push(bottle);
        }
    }

    Selection {
        backfilled: bottles.len() - diverse,
        bottles,
    }
}
