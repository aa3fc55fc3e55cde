//! Feature extraction for whisky recommendation.
//!
//! Provides pure functions and small value types used in scoring:
//! - Spirit style classification (region and flavor inference)
//! - One-hot vocabulary and feature encoding
//! - Min-max scaling
//! - Euclidean distance

use barkeep_model::{AbvTier, CatalogBottle, Flavor, FlavorVector, PreferenceProfile, Region};
use std::collections::BTreeSet;

/// Proof above which a bottle gets extra spice.
pub const HIGH_PROOF: f64 = 100.0;

/// Spice added to high-proof bottles.
pub const HIGH_PROOF_SPICE: f64 = 15.0;

/// Broad style of a free-text spirit type.
///
/// This is the single heuristic table for region and flavor inference.
/// The catalog and the preference extractor both go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiritStyle {
    Bourbon,
    Rye,
    Scotch,
    Japanese,
    Irish,
    Canadian,
    Gin,
    Other,
}

impl SpiritStyle {
    /// Classify a spirit type string.
    pub fn classify(spirit_type: &str) -> Self {
        let lowered = spirit_type.trim().to_lowercase();
        let has_word = |word: &str| lowered.split_whitespace().any(|w| w == word);

        if lowered.contains("scotch") {
            Self::Scotch
        } else if has_word("japanese") {
            Self::Japanese
        } else if has_word("irish") {
            Self::Irish
        } else if has_word("canadian") {
            Self::Canadian
        } else if has_word("bourbon") {
            Self::Bourbon
        } else if has_word("rye") {
            Self::Rye
        } else if has_word("gin") {
            Self::Gin
        } else {
            Self::Other
        }
    }

    pub fn region(&self) -> Region {
        match self {
            Self::Bourbon | Self::Rye => Region::America,
            Self::Scotch => Region::Scotland,
            Self::Japanese => Region::Japan,
            Self::Irish => Region::Ireland,
            Self::Canadian => Region::Canada,
            Self::Gin | Self::Other => Region::Unknown,
        }
    }

    /// Characteristic flavors before any proof adjustment.
    pub fn base_flavors(&self) -> FlavorVector {
        match self {
            Self::Bourbon => FlavorVector {
                vanilla: 70.0,
                caramel: 60.0,
                spicy: 30.0,
                ..Default::default()
            },
            Self::Rye => FlavorVector {
                spicy: 80.0,
                fruity: 20.0,
                ..Default::default()
            },
            Self::Scotch => FlavorVector {
                peated: 40.0,
                smoky: 30.0,
                sherried: 25.0,
                ..Default::default()
            },
            Self::Gin => FlavorVector {
                fruity: 50.0,
                ..Default::default()
            },
            Self::Japanese | Self::Irish | Self::Canadian | Self::Other => FlavorVector::default(),
        }
    }
}

/// Infer the producing region from a spirit type.
pub fn infer_region(spirit_type: &str) -> Region {
    SpiritStyle::classify(spirit_type).region()
}

/// Infer a flavor vector from spirit type and proof.
pub fn infer_flavors(spirit_type: &str, proof: f64) -> FlavorVector {
    let mut flavors = SpiritStyle::classify(spirit_type).base_flavors();
    if proof > HIGH_PROOF {
        *flavors.get_mut(Flavor::Spicy) += HIGH_PROOF_SPICE;
    }
    flavors
}

/// Column layout of the numeric feature space for one scoring run.
///
/// The one-hot vocabularies are snapshotted from the candidate set and then
/// used for both the candidate rows and the profile projection.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpace {
    spirit_types: Vec<String>,
    regions: Vec<Region>,
}

impl FeatureSpace {
    /// Number of continuous columns: ABV, MSRP and one per flavor.
    const CONTINUOUS: usize = 2 + Flavor::ALL.len();

    /// Build the vocabulary from the candidates' distinct values.
    pub fn from_bottles<'a>(bottles: impl IntoIterator<Item = &'a CatalogBottle>) -> Self {
        let mut spirit_types = BTreeSet::new();
        let mut regions = BTreeSet::new();
        for bottle in bottles {
            spirit_types.insert(bottle.spirit_type.clone());
            regions.insert(bottle.region);
        }

        Self {
            spirit_types: spirit_types.into_iter().collect(),
            regions: regions.into_iter().collect(),
        }
    }

    pub fn dimension(&self) -> usize {
        Self::CONTINUOUS + self.spirit_types.len() + self.regions.len()
    }

    /// Human-readable column names, in encoding order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec!["abv".to_string(), "msrp".to_string()];
        names.extend(Flavor::ALL.iter().map(|f| format!("flavor_{}", f)));
        names.extend(self.spirit_types.iter().map(|s| format!("spirit_{}", s)));
        names.extend(self.regions.iter().map(|r| format!("region_{}", r)));
        names
    }

    /// Encode a catalog bottle (hard one-hot membership).
    pub fn encode_bottle(&self, bottle: &CatalogBottle) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.dimension());
        row.push(bottle.abv);
        row.push(bottle.msrp);
        row.extend(bottle.flavor_profile.iter().map(|(_, v)| v));
        row.extend(
            self.spirit_types
                .iter()
                .map(|s| if *s == bottle.spirit_type { 1.0 } else { 0.0 }),
        );
        row.extend(
            self.regions
                .iter()
                .map(|r| if *r == bottle.region { 1.0 } else { 0.0 }),
        );
        row
    }

    /// Project a preference profile into the same space (soft membership).
    pub fn project_profile(&self, profile: &PreferenceProfile) -> Vec<f64> {
        let abv = AbvTier::ALL
            .iter()
            .map(|tier| profile.abv_share(*tier) * tier.midpoint())
            .sum::<f64>()
            / 100.0;

        let mut row = Vec::with_capacity(self.dimension());
        row.push(abv);
        row.push(profile.average_bottle_price);
        row.extend(Flavor::ALL.iter().map(|f| profile.flavor(*f)));
        row.extend(
            self.spirit_types
                .iter()
                .map(|s| profile.spirit_share(s).unwrap_or(0.0) / 100.0),
        );
        row.extend(
            self.regions
                .iter()
                .map(|r| profile.region_share(*r).unwrap_or(0.0) / 100.0),
        );
        row
    }
}

/// Per-column min-max scaler.
///
/// Maps each fitted column onto [0, 1]. A zero-range column is only shifted,
/// so every fitted row lands on 0 for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    range: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit on rows of equal width. An empty input yields a zero-width scaler.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut min = vec![f64::INFINITY; width];
        let mut max = vec![f64::NEG_INFINITY; width];

        for row in rows {
            for (i, value) in row.iter().enumerate().take(width) {
                min[i] = min[i].min(*value);
                max[i] = max[i].max(*value);
            }
        }

        let range = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| {
                let r = hi - lo;
                if r > 0.0 {
                    r
                } else {
                    1.0
                }
            })
            .collect();

        Self { min, range }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.min.iter().zip(&self.range))
            .map(|(value, (lo, range))| (value - lo) / range)
            .collect()
    }
}

/// Euclidean distance between two equal-length vectors.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bottle(id: u64, spirit: &str, abv: f64, msrp: f64) -> CatalogBottle {
        CatalogBottle {
            id,
            name: format!("Bottle {}", id),
            spirit_type: spirit.to_string(),
            region: infer_region(spirit),
            proof: abv * 2.0,
            abv,
            msrp,
            flavor_profile: infer_flavors(spirit, abv * 2.0),
            total_score: 0.0,
            brand: None,
            popularity: None,
            size: None,
            image_url: None,
        }
    }

    #[test]
    fn test_region_inference() {
        assert_eq!(infer_region("Bourbon"), Region::America);
        assert_eq!(infer_region("Rye"), Region::America);
        assert_eq!(infer_region("Single Malt Scotch"), Region::Scotland);
        assert_eq!(infer_region("Japanese Whisky"), Region::Japan);
        assert_eq!(infer_region("Irish Whiskey"), Region::Ireland);
        assert_eq!(infer_region("Canadian Whisky"), Region::Canada);
        assert_eq!(infer_region("Gin"), Region::Unknown);
        assert_eq!(infer_region("Tequila"), Region::Unknown);
    }

    #[test]
    fn test_flavor_inference_with_proof_boost() {
        let bourbon = infer_flavors("Bourbon", 90.0);
        assert_eq!(bourbon.vanilla, 70.0);
        assert_eq!(bourbon.caramel, 60.0);
        assert_eq!(bourbon.spicy, 30.0);

        let barrel_proof = infer_flavors("Bourbon", 124.0);
        assert_eq!(barrel_proof.spicy, 45.0);

        // Exactly 100 proof is not boosted
        assert_eq!(infer_flavors("Rye", 100.0).spicy, 80.0);
    }

    #[test]
    fn test_flavor_inference_is_deterministic() {
        assert_eq!(infer_flavors("Islay Scotch", 110.0), infer_flavors("Islay Scotch", 110.0));
    }

    #[test]
    fn test_feature_space_vocabulary_is_sorted_and_shared() {
        let bottles = vec![
            bottle(1, "Rye", 50.0, 40.0),
            bottle(2, "Bourbon", 45.0, 30.0),
            bottle(3, "Rye", 55.0, 60.0),
        ];
        let space = FeatureSpace::from_bottles(&bottles);

        assert_eq!(space.dimension(), 9 + 2 + 1);
        let names = space.column_names();
        assert_eq!(names[9], "spirit_Bourbon");
        assert_eq!(names[10], "spirit_Rye");
        assert_eq!(names[11], "region_America");

        let row = space.encode_bottle(&bottles[0]);
        assert_eq!(row.len(), space.dimension());
        assert_eq!(&row[9..], &[0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_profile_projection_uses_soft_membership() {
        let bottles = vec![bottle(1, "Rye", 50.0, 40.0), bottle(2, "Bourbon", 45.0, 30.0)];
        let space = FeatureSpace::from_bottles(&bottles);

        let mut profile = PreferenceProfile::default();
        profile.abv_preferences.insert(AbvTier::Low, 50.0);
        profile.abv_preferences.insert(AbvTier::High, 50.0);
        profile.spirit_types.insert("Bourbon".into(), 75.0);
        profile.preferred_regions.insert(Region::America, 100.0);
        profile.average_bottle_price = 42.0;

        let row = space.project_profile(&profile);
        assert_eq!(row[0], 47.5);
        assert_eq!(row[1], 42.0);
        assert_eq!(&row[9..], &[0.75, 0.0, 1.0]);
    }

    #[test]
    fn test_min_max_scaler() {
        let rows = vec![vec![0.0, 5.0], vec![10.0, 5.0], vec![5.0, 5.0]];
        let scaler = MinMaxScaler::fit(&rows);

        assert_eq!(scaler.transform(&rows[0]), vec![0.0, 0.0]);
        assert_eq!(scaler.transform(&rows[1]), vec![1.0, 0.0]);
        assert_eq!(scaler.transform(&rows[2]), vec![0.5, 0.0]);
        // Out-of-range values extrapolate rather than clamp
        assert_eq!(scaler.transform(&[20.0, 7.0]), vec![2.0, 2.0]);
    }

    #[test]
    fn test_euclidean_distance() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(euclidean_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }
}
