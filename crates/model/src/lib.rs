//! Core domain model for Barkeep whisky recommendations.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `OwnedBottleEntry`: One entry of a user's bar, as reported by BAXUS
//! - `CatalogBottle`: A candidate bottle from the reference catalog
//! - `PreferenceProfile`: The taste summary derived from a collection
//! - `Recommendation`: A catalog bottle plus its explanation
//! - `Flavor`, `Region`, `PriceTier`, `AbvTier`: Shared vocabularies

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the fixed flavor dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    Peated,
    Sherried,
    Fruity,
    Spicy,
    Smoky,
    Vanilla,
    Caramel,
}

impl Flavor {
    /// Every flavor, in canonical order.
    pub const ALL: [Flavor; 7] = [
        Self::Peated,
        Self::Sherried,
        Self::Fruity,
        Self::Spicy,
        Self::Smoky,
        Self::Vanilla,
        Self::Caramel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Peated => "peated",
            Self::Sherried => "sherried",
            Self::Fruity => "fruity",
            Self::Spicy => "spicy",
            Self::Smoky => "smoky",
            Self::Vanilla => "vanilla",
            Self::Caramel => "caramel",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rank flavors by intensity, strongest first.
///
/// Zero-valued flavors are dropped. Ties keep canonical `Flavor::ALL` order.
pub fn top_flavors(values: impl IntoIterator<Item = (Flavor, f64)>, n: usize) -> Vec<Flavor> {
    let mut ranked: Vec<(Flavor, f64)> = values.into_iter().filter(|(_, v)| *v > 0.0).collect();
    ranked.sort_by_key(|(flavor, _)| *flavor);
    // sort_by is stable, so equal intensities stay in canonical order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(n).map(|(flavor, _)| flavor).collect()
}

/// Intensity per flavor dimension (typically 0-100).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlavorVector {
    #[serde(default)]
    pub peated: f64,
    #[serde(default)]
    pub sherried: f64,
    #[serde(default)]
    pub fruity: f64,
    #[serde(default)]
    pub spicy: f64,
    #[serde(default)]
    pub smoky: f64,
    #[serde(default)]
    pub vanilla: f64,
    #[serde(default)]
    pub caramel: f64,
}

impl FlavorVector {
    pub fn get(&self, flavor: Flavor) -> f64 {
        match flavor {
            Flavor::Peated => self.peated,
            Flavor::Sherried => self.sherried,
            Flavor::Fruity => self.fruity,
            Flavor::Spicy => self.spicy,
            Flavor::Smoky => self.smoky,
            Flavor::Vanilla => self.vanilla,
            Flavor::Caramel => self.caramel,
        }
    }

    pub fn get_mut(&mut self, flavor: Flavor) -> &mut f64 {
        match flavor {
            Flavor::Peated => &mut self.peated,
            Flavor::Sherried => &mut self.sherried,
            Flavor::Fruity => &mut self.fruity,
            Flavor::Spicy => &mut self.spicy,
            Flavor::Smoky => &mut self.smoky,
            Flavor::Vanilla => &mut self.vanilla,
            Flavor::Caramel => &mut self.caramel,
        }
    }

    /// Iterate `(flavor, intensity)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Flavor, f64)> + '_ {
        Flavor::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    /// The `n` strongest non-zero flavors.
    pub fn top(&self, n: usize) -> Vec<Flavor> {
        top_flavors(self.iter(), n)
    }
}

/// Producing region of a whisky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    America,
    Scotland,
    Japan,
    Ireland,
    Canada,
    Unknown,
}

impl Default for Region {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Self::America => "America",
            Self::Scotland => "Scotland",
            Self::Japan => "Japan",
            Self::Ireland => "Ireland",
            Self::Canada => "Canada",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }
}

impl From<&str> for Region {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "america" | "usa" | "united states" => Self::America,
            "scotland" => Self::Scotland,
            "japan" => Self::Japan,
            "ireland" => Self::Ireland,
            "canada" => Self::Canada,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Price bands used to summarize spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    /// $0-50
    Entry,
    /// $51-100
    Mid,
    /// $101-200
    Premium,
    /// $201+
    Luxury,
}

impl PriceTier {
    pub fn from_price(price: f64) -> Self {
        if price <= 50.0 {
            Self::Entry
        } else if price <= 100.0 {
            Self::Mid
        } else if price <= 200.0 {
            Self::Premium
        } else {
            Self::Luxury
        }
    }
}

/// Strength bands, by ABV percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbvTier {
    /// Below 43%
    Low,
    /// 43-50%
    Medium,
    /// Above 50%
    High,
}

impl AbvTier {
    pub const ALL: [AbvTier; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn from_abv(abv: f64) -> Self {
        if abv < 43.0 {
            Self::Low
        } else if abv <= 50.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Representative ABV used when projecting a profile onto a bottle.
    pub fn midpoint(&self) -> f64 {
        match self {
            Self::Low => 40.0,
            Self::Medium => 46.0,
            Self::High => 55.0,
        }
    }
}

/// Convert US proof to ABV percent.
pub fn proof_to_abv(proof: f64) -> f64 {
    proof / 2.0
}

/// Product details attached to an owned bottle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog product id
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub name: Option<String>,

    /// Free-text spirit type (e.g. "Bourbon", "Single Malt Scotch")
    #[serde(default, alias = "spirit_type")]
    pub spirit: Option<String>,

    #[serde(default)]
    pub brand: Option<String>,

    /// Average market price in USD
    #[serde(default, alias = "avg_msrp")]
    pub average_msrp: Option<f64>,

    #[serde(default)]
    pub proof: Option<f64>,
}

/// One bottle in a user's bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnedBottleEntry {
    /// Bar entry id (per-user)
    #[serde(default)]
    pub id: Option<u64>,

    /// Catalog release this entry refers to
    #[serde(default)]
    pub release_id: Option<u64>,

    #[serde(default)]
    pub product: Option<Product>,
}

impl OwnedBottleEntry {
    /// Create an entry for testing.
    pub fn new(release_id: u64, product: Product) -> Self {
        Self {
            id: None,
            release_id: Some(release_id),
            product: Some(product),
        }
    }

    /// The product, if it carries a catalog id.
    pub fn usable_product(&self) -> Option<&Product> {
        self.product.as_ref().filter(|p| p.id.is_some())
    }
}

/// A candidate bottle from the reference catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBottle {
    pub id: u64,

    pub name: String,

    pub spirit_type: String,

    /// Producing region (derived from spirit type when the source omits it)
    pub region: Region,

    pub proof: f64,

    pub abv: f64,

    /// Suggested retail price in USD
    pub msrp: f64,

    /// Derived from spirit type and proof
    pub flavor_profile: FlavorVector,

    /// Aggregate rating, 0-100
    #[serde(default)]
    pub total_score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,

    /// Bottle size in millilitres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Taste summary derived from one collection.
///
/// Categorical maps hold percentage shares of their own facet; the flavor
/// map holds raw per-bottle averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub preferred_regions: BTreeMap<Region, f64>,
    pub spirit_types: BTreeMap<String, f64>,
    pub flavor_profile: BTreeMap<Flavor, f64>,
    pub price_ranges: BTreeMap<PriceTier, f64>,
    pub brand_preferences: BTreeMap<String, f64>,
    pub abv_preferences: BTreeMap<AbvTier, f64>,
    pub average_bottle_price: f64,
    /// Highest observed price plus a 20% buffer; 0 when no prices are known
    pub price_ceiling: f64,
    pub collection_size: usize,
}

impl PreferenceProfile {
    pub fn is_empty(&self) -> bool {
        self.collection_size == 0
    }

    pub fn region_share(&self, region: Region) -> Option<f64> {
        self.preferred_regions.get(&region).copied()
    }

    pub fn spirit_share(&self, spirit_type: &str) -> Option<f64> {
        self.spirit_types.get(spirit_type).copied()
    }

    pub fn abv_share(&self, tier: AbvTier) -> f64 {
        self.abv_preferences.get(&tier).copied().unwrap_or(0.0)
    }

    pub fn flavor(&self, flavor: Flavor) -> f64 {
        self.flavor_profile.get(&flavor).copied().unwrap_or(0.0)
    }

    /// The `n` strongest non-zero flavors in the collection.
    pub fn top_flavors(&self, n: usize) -> Vec<Flavor> {
        top_flavors(self.flavor_profile.iter().map(|(f, v)| (*f, *v)), n)
    }
}

/// A recommended bottle with its justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub bottle: CatalogBottle,

    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_str() {
        assert_eq!(Region::from("Scotland"), Region::Scotland);
        assert_eq!(Region::from("  japan "), Region::Japan);
        assert_eq!(Region::from("Mars"), Region::Unknown);
    }

    #[test]
    fn test_price_tier_boundaries() {
        assert_eq!(PriceTier::from_price(50.0), PriceTier::Entry);
        assert_eq!(PriceTier::from_price(50.01), PriceTier::Mid);
        assert_eq!(PriceTier::from_price(100.0), PriceTier::Mid);
        assert_eq!(PriceTier::from_price(200.0), PriceTier::Premium);
        assert_eq!(PriceTier::from_price(200.5), PriceTier::Luxury);
    }

    #[test]
    fn test_abv_tier_boundaries() {
        assert_eq!(AbvTier::from_abv(42.9), AbvTier::Low);
        assert_eq!(AbvTier::from_abv(43.0), AbvTier::Medium);
        assert_eq!(AbvTier::from_abv(50.0), AbvTier::Medium);
        assert_eq!(AbvTier::from_abv(50.5), AbvTier::High);
        assert_eq!(AbvTier::from_abv(proof_to_abv(100.0)), AbvTier::Medium);
    }

    #[test]
    fn test_top_flavors_skips_zero_and_keeps_order_on_ties() {
        let flavors = FlavorVector {
            spicy: 30.0,
            vanilla: 70.0,
            caramel: 30.0,
            ..Default::default()
        };
        assert_eq!(flavors.top(2), vec![Flavor::Vanilla, Flavor::Spicy]);
        assert!(FlavorVector::default().top(2).is_empty());
    }

    #[test]
    fn test_usable_product_requires_id() {
        let mut entry = OwnedBottleEntry::new(7, Product::default());
        assert!(entry.usable_product().is_none());

        entry.product = Some(Product {
            id: Some(1),
            ..Default::default()
        });
        assert!(entry.usable_product().is_some());
    }

    #[test]
    fn test_entry_deserialization_tolerates_missing_fields() {
        let json = r#"{"id": 5, "product": {"id": 12, "spirit": "Bourbon", "average_msrp": 45.5}}"#;
        let entry: OwnedBottleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.release_id, None);
        let product = entry.usable_product().unwrap();
        assert_eq!(product.spirit.as_deref(), Some("Bourbon"));
        assert_eq!(product.proof, None);
    }

    #[test]
    fn test_recommendation_flattens_bottle_fields() {
        let rec = Recommendation {
            bottle: CatalogBottle {
                id: 1,
                name: "Test Bottle".into(),
                spirit_type: "Rye".into(),
                region: Region::America,
                proof: 100.0,
                abv: 50.0,
                msrp: 40.0,
                flavor_profile: FlavorVector::default(),
                total_score: 88.0,
                brand: None,
                popularity: None,
                size: None,
                image_url: None,
            },
            explanation: "Because.".into(),
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["region"], "America");
        assert_eq!(value["explanation"], "Because.");
    }

    #[test]
    fn test_profile_serializes_enum_keys() {
        let mut profile = PreferenceProfile::default();
        profile.price_ranges.insert(PriceTier::Entry, 100.0);
        profile.flavor_profile.insert(Flavor::Vanilla, 65.0);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"entry\":100.0"));
        assert!(json.contains("\"vanilla\":65.0"));
    }
}
