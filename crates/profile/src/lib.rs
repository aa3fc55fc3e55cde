//! Preference extraction from a user's bar.
//!
//! Turns a raw, possibly messy collection into a `PreferenceProfile`:
//! percentage shares per region, spirit type, brand, price tier and ABV
//! tier, plus per-bottle flavor averages and price bounds.

use barkeep_features::{infer_flavors, infer_region};
use barkeep_model::{
    proof_to_abv, AbvTier, Flavor, FlavorVector, OwnedBottleEntry, PreferenceProfile, PriceTier,
    Product, Region,
};
use std::collections::BTreeMap;

/// Buffer applied to the most expensive owned bottle.
pub const PRICE_CEILING_FACTOR: f64 = 1.2;

/// Analyze a collection into a preference profile.
///
/// Entries without a product id are skipped. An empty collection, or one
/// with no usable entries, yields the zero profile.
pub fn analyze_preferences(collection: &[OwnedBottleEntry]) -> PreferenceProfile {
    if collection.is_empty() {
        tracing::warn!("No bar data found in collection");
        return PreferenceProfile::default();
    }

    tracing::debug!(entries = collection.len(), "Analyzing collection");

    let mut tally = Tally::default();
    for entry in collection {
        match entry.usable_product() {
            Some(product) => tally.add(product),
            None => tracing::debug!(entry_id = ?entry.id, "Skipping entry without product id"),
        }
    }

    tally.into_profile()
}

/// Raw counters accumulated over one collection.
#[derive(Debug, Default)]
struct Tally {
    size: usize,
    regions: BTreeMap<Region, u32>,
    spirit_types: BTreeMap<String, u32>,
    price_ranges: BTreeMap<PriceTier, u32>,
    brands: BTreeMap<String, u32>,
    abv_tiers: BTreeMap<AbvTier, u32>,
    flavor_sums: FlavorVector,
    total_price: f64,
    max_price: f64,
}

impl Tally {
    fn add(&mut self, product: &Product) {
        self.size += 1;

        let proof = product.proof.filter(|p| *p > 0.0);

        if let Some(spirit) = non_empty(product.spirit.as_deref()) {
            *self.spirit_types.entry(spirit.to_string()).or_default() += 1;

            let region = infer_region(spirit);
            if region.is_known() {
                *self.regions.entry(region).or_default() += 1;
            }

            let contribution = infer_flavors(spirit, proof.unwrap_or(0.0));
            for (flavor, value) in contribution.iter() {
                *self.flavor_sums.get_mut(flavor) += value;
            }
        }

        if let Some(price) = product.average_msrp.filter(|p| *p > 0.0) {
            self.total_price += price;
            self.max_price = self.max_price.max(price);
            *self.price_ranges.entry(PriceTier::from_price(price)).or_default() += 1;
        }

        if let Some(brand) = non_empty(product.brand.as_deref()) {
            *self.brands.entry(brand.to_string()).or_default() += 1;
        }

        if let Some(proof) = proof {
            let tier = AbvTier::from_abv(proof_to_abv(proof));
            *self.abv_tiers.entry(tier).or_default() += 1;
        }
    }

    fn into_profile(self) -> PreferenceProfile {
        if self.size == 0 {
            return PreferenceProfile::default();
        }

        let divisor = self.size as f64;
        let flavor_profile = Flavor::ALL
            .iter()
            .map(|f| (*f, self.flavor_sums.get(*f) / divisor))
            .collect();

        PreferenceProfile {
            preferred_regions: to_percentages(self.regions),
            spirit_types: to_percentages(self.spirit_types),
            flavor_profile,
            price_ranges: to_percentages(self.price_ranges),
            brand_preferences: to_percentages(self.brands),
            abv_preferences: to_percentages(self.abv_tiers),
            average_bottle_price: self.total_price / divisor,
            price_ceiling: self.max_price * PRICE_CEILING_FACTOR,
            collection_size: self.size,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Convert counts into percentage shares of their own total.
fn to_percentages<K: Ord>(counts: BTreeMap<K, u32>) -> BTreeMap<K, f64> {
    let total: u32 = counts.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }

    counts
        .into_iter()
        .map(|(key, count)| (key, count as f64 / total as f64 * 100.0))
        .collect()
}
