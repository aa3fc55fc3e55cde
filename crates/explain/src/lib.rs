//! Explanation generation for whisky recommendations.
//!
//! Converts the signals linking a recommended bottle to a user's profile
//! into short human-readable sentences for display next to each pick.

use barkeep_features::infer_region;
use barkeep_model::{CatalogBottle, Flavor, OwnedBottleEntry, PreferenceProfile, Region};
use serde::{Deserialize, Serialize};

/// Share (percent) above which a region or spirit type counts as preferred.
pub const AFFINITY_SHARE: f64 = 20.0;

/// Share (percent) below which a region or spirit type counts as new ground.
pub const NOVELTY_SHARE: f64 = 10.0;

/// One justification sentence, kept structured until rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum ExplanationClause {
    /// The region is well represented in the collection
    RegionAffinity { region: Region },

    /// The collection holds a bottle from the same region
    RegionSimilar { region: Region, owned_name: String },

    /// The region is new or rare in the collection
    RegionDiversity { region: Region },

    SpiritMatch { spirit_type: String },

    SpiritVariety { spirit_type: String },

    /// Shared dominant flavors
    FlavorMatch { flavors: Vec<Flavor> },

    /// The bottle's dominant flavor is not a favourite yet
    FlavorComplement { flavor: Flavor },

    PriceValue { price: f64 },

    PriceParity,

    PricePremium,

    /// No price history to compare against
    PriceNeutral { price: f64 },

    QualityExceptional,

    QualityExcellent,

    QualitySolid,
}

impl ExplanationClause {
    /// Get a short label for this clause.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RegionAffinity { .. } => "Favourite Region",
            Self::RegionSimilar { .. } => "Familiar Region",
            Self::RegionDiversity { .. } => "New Region",
            Self::SpiritMatch { .. } => "Preferred Style",
            Self::SpiritVariety { .. } => "New Style",
            Self::FlavorMatch { .. } => "Flavor Match",
            Self::FlavorComplement { .. } => "Complementary Flavor",
            Self::PriceValue { .. } => "Good Value",
            Self::PriceParity => "Usual Price",
            Self::PricePremium => "Premium",
            Self::PriceNeutral { .. } => "Price",
            Self::QualityExceptional => "Exceptional",
            Self::QualityExcellent => "Excellent",
            Self::QualitySolid => "Well Rated",
        }
    }

    /// Render as a full sentence.
    pub fn sentence(&self) -> String {
        match self {
            Self::RegionAffinity { region } => format!(
                "This {} whisky aligns with your preference for bottles from this region.",
                region
            ),
            Self::RegionSimilar { region, owned_name } => {
                format!("Like your {}, this is also from {}.", owned_name, region)
            }
            Self::RegionDiversity { region } => format!(
                "This would add diversity to your collection with a {} whisky.",
                region
            ),
            Self::SpiritMatch { spirit_type } => {
                format!("This {} matches your preferred style.", spirit_type)
            }
            Self::SpiritVariety { spirit_type } => {
                format!("This {} would add variety to your collection.", spirit_type)
            }
            Self::FlavorMatch { flavors } => format!(
                "The {} notes in this whisky match your flavor preferences.",
                flavors.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
            ),
            Self::FlavorComplement { flavor } => format!(
                "This whisky's {} character would complement your collection.",
                flavor
            ),
            Self::PriceValue { price } => format!(
                "At ${:.2}, this is a good value compared to your collection average.",
                price
            ),
            Self::PriceParity => {
                "This is priced similarly to most bottles in your collection.".to_string()
            }
            Self::PricePremium => "This premium offering is slightly above your usual price \
                                   range but worth considering."
                .to_string(),
            Self::PriceNeutral { price } => format!(
                "At ${:.2}, this is a bottle worth considering for your collection.",
                price
            ),
            Self::QualityExceptional => {
                "This highly-rated whisky is widely regarded as exceptional.".to_string()
            }
            Self::QualityExcellent => "This well-rated whisky offers excellent quality.".to_string(),
            Self::QualitySolid => "This solid whisky has positive ratings overall.".to_string(),
        }
    }
}

/// Explain why `bottle` suits the owner of `collection`.
///
/// Never empty: a price clause applies to every bottle.
pub fn explain(
    bottle: &CatalogBottle,
    profile: &PreferenceProfile,
    collection: &[OwnedBottleEntry],
) -> String {
    explain_clauses(bottle, profile, collection)
        .iter()
        .map(|c| c.sentence())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collect the applicable clauses in display order: region, spirit type,
/// flavor, price, quality.
pub fn explain_clauses(
    bottle: &CatalogBottle,
    profile: &PreferenceProfile,
    collection: &[OwnedBottleEntry],
) -> Vec<ExplanationClause> {
    [
        region_clause(bottle, profile, collection),
        spirit_clause(bottle, profile),
        flavor_clause(bottle, profile),
        Some(price_clause(bottle, profile)),
        quality_clause(bottle),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn region_clause(
    bottle: &CatalogBottle,
    profile: &PreferenceProfile,
    collection: &[OwnedBottleEntry],
) -> Option<ExplanationClause> {
    let region = bottle.region;
    if !region.is_known() {
        return None;
    }

    let share = profile.region_share(region);
    if share.is_some_and(|s| s > AFFINITY_SHARE) {
        return Some(ExplanationClause::RegionAffinity { region });
    }

    if let Some(owned_name) = owned_bottle_from(region, collection) {
        return Some(ExplanationClause::RegionSimilar {
            region,
            owned_name: owned_name.to_string(),
        });
    }

    match share {
        Some(s) if s >= NOVELTY_SHARE => None,
        _ => Some(ExplanationClause::RegionDiversity { region }),
    }
}

/// Name of the first owned bottle from `region`.
fn owned_bottle_from(region: Region, collection: &[OwnedBottleEntry]) -> Option<&str> {
    collection
        .iter()
        .filter_map(|entry| entry.product.as_ref())
        .find(|product| {
            product
                .spirit
                .as_deref()
                .is_some_and(|spirit| infer_region(spirit) == region)
        })
        .and_then(|product| product.name.as_deref())
}

fn spirit_clause(bottle: &CatalogBottle, profile: &PreferenceProfile) -> Option<ExplanationClause> {
    let spirit_type = bottle.spirit_type.clone();
    match profile.spirit_share(&bottle.spirit_type) {
        Some(s) if s > AFFINITY_SHARE => Some(ExplanationClause::SpiritMatch { spirit_type }),
        Some(s) if s >= NOVELTY_SHARE => None,
        _ => Some(ExplanationClause::SpiritVariety { spirit_type }),
    }
}

fn flavor_clause(bottle: &CatalogBottle, profile: &PreferenceProfile) -> Option<ExplanationClause> {
    let bottle_top = bottle.flavor_profile.top(2);
    let user_top = profile.top_flavors(2);

    let shared: Vec<Flavor> = bottle_top
        .iter()
        .filter(|f| user_top.contains(f))
        .copied()
        .collect();

    if !shared.is_empty() {
        return Some(ExplanationClause::FlavorMatch { flavors: shared });
    }

    bottle_top
        .first()
        .map(|flavor| ExplanationClause::FlavorComplement { flavor: *flavor })
}

fn price_clause(bottle: &CatalogBottle, profile: &PreferenceProfile) -> ExplanationClause {
    let price = bottle.msrp;
    let average = profile.average_bottle_price;

    if average <= 0.0 {
        ExplanationClause::PriceNeutral { price }
    } else if price <= average * 0.8 {
        ExplanationClause::PriceValue { price }
    } else if price <= average * 1.2 {
        ExplanationClause::PriceParity
    } else {
        ExplanationClause::PricePremium
    }
}

fn quality_clause(bottle: &CatalogBottle) -> Option<ExplanationClause> {
    let score = bottle.total_score;
    if score > 90.0 {
        Some(ExplanationClause::QualityExceptional)
    } else if score > 85.0 {
        Some(ExplanationClause::QualityExcellent)
    } else if score > 80.0 {
        Some(ExplanationClause::QualitySolid)
    } else {
        None
    }
}
