//! Reference catalog of candidate bottles.
//!
//! Loads the bottle dataset, derives region and flavor fields through the
//! shared spirit-style table, and exposes read-only lookups. A loaded
//! catalog is shared through a cheap `CatalogHandle`.

use barkeep_features::{infer_flavors, infer_region};
use barkeep_model::{CatalogBottle, Region};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Dataset bundled into the binary.
const EMBEDDED_DATASET: &str = include_str!("../data/bottles.json");

/// Errors that make a catalog unusable.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate bottle id: {0}")]
    DuplicateId(u64),

    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: u64, reason: String },

    #[error("Catalog is empty")]
    Empty,
}

/// A raw dataset row, before derived fields are filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spirit_type: Option<String>,

    /// Explicit region; derived from the spirit type when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abv: Option<f64>,

    #[serde(default, alias = "avg_msrp", skip_serializing_if = "Option::is_none")]
    pub msrp: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CatalogRecord {
    /// Create a minimal record for testing.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        spirit_type: impl Into<String>,
        proof: f64,
        msrp: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            spirit_type: Some(spirit_type.into()),
            proof: Some(proof),
            msrp: Some(msrp),
            ..Default::default()
        }
    }

    pub fn with_score(mut self, total_score: f64) -> Self {
        self.total_score = Some(total_score);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Resolve derived fields into a catalog bottle.
    ///
    /// Proof and ABV fill each other in; at least one and an MSRP are required.
    pub fn into_bottle(self) -> Result<CatalogBottle, CatalogError> {
        let id = self.id;
        let invalid = move |reason: &str| CatalogError::InvalidRecord {
            id,
            reason: reason.to_string(),
        };

        let msrp = self
            .msrp
            .filter(|m| m.is_finite() && *m >= 0.0)
            .ok_or_else(|| invalid("missing msrp"))?;
        let (proof, abv) = match (self.proof, self.abv) {
            (Some(proof), Some(abv)) => (proof, abv),
            (Some(proof), None) => (proof, proof / 2.0),
            (None, Some(abv)) => (abv * 2.0, abv),
            (None, None) => return Err(invalid("missing proof and abv")),
        };

        let spirit_type = self.spirit_type.unwrap_or_else(|| "Unknown".to_string());
        let region = self
            .region
            .as_deref()
            .map(Region::from)
            .unwrap_or_else(|| infer_region(&spirit_type));
        let flavor_profile = infer_flavors(&spirit_type, proof);

        Ok(CatalogBottle {
            id: self.id,
            name: self.name,
            spirit_type,
            region,
            proof,
            abv,
            msrp,
            flavor_profile,
            total_score: self.total_score.unwrap_or(0.0),
            brand: self.brand,
            popularity: self.popularity,
            size: self.size,
            image_url: self.image_url,
        })
    }
}

/// The fixed set of candidate bottles, in dataset order.
#[derive(Debug, Clone)]
pub struct Catalog {
    bottles: Vec<CatalogBottle>,
}

impl Catalog {
    /// Build a catalog from raw records.
    pub fn from_records(records: Vec<CatalogRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(records.len());
        let mut bottles = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id) {
                return Err(CatalogError::DuplicateId(record.id));
            }
            bottles.push(record.into_bottle()?);
        }

        Ok(Self { bottles })
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    /// Load a JSON dataset file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), bottles = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// The dataset bundled with the crate.
    pub fn embedded() -> Result<Self, CatalogError> {
        let catalog = Self::from_json_str(EMBEDDED_DATASET)?;
        tracing::debug!(bottles = catalog.len(), "Loaded embedded catalog");
        Ok(catalog)
    }

    pub fn bottles(&self) -> &[CatalogBottle] {
        &self.bottles
    }

    pub fn len(&self) -> usize {
        self.bottles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bottles.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&CatalogBottle> {
        self.bottles.iter().find(|b| b.id == id)
    }

    pub fn by_region(&self, region: Region) -> Vec<&CatalogBottle> {
        self.bottles.iter().filter(|b| b.region == region).collect()
    }

    /// Bottles whose spirit type matches exactly (case-insensitive).
    pub fn by_spirit_type(&self, spirit_type: &str) -> Vec<&CatalogBottle> {
        self.bottles
            .iter()
            .filter(|b| b.spirit_type.eq_ignore_ascii_case(spirit_type))
            .collect()
    }

    /// Bottles with `min_price <= msrp <= max_price`.
    pub fn by_price_range(&self, min_price: f64, max_price: f64) -> Vec<&CatalogBottle> {
        self.bottles
            .iter()
            .filter(|b| b.msrp >= min_price && b.msrp <= max_price)
            .collect()
    }
}

/// Shared, immutable access to a loaded catalog.
#[derive(Debug, Clone)]
pub struct CatalogHandle(Arc<Catalog>);

static SHARED: OnceCell<CatalogHandle> = OnceCell::new();

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self(Arc::new(catalog))
    }

    /// Process-wide handle to the embedded catalog, loaded on first use.
    pub fn shared() -> Result<Self, CatalogError> {
        SHARED
            .get_or_try_init(|| Catalog::embedded().map(Self::new))
            .cloned()
    }

    /// Load a dataset file into a fresh handle.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Catalog::from_path(path).map(Self::new)
    }
}

impl Deref for CatalogHandle {
    type Target = Catalog;

    fn deref(&self) -> &Catalog {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barkeep_model::FlavorVector;

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert!(catalog.len() >= 40);

        let ids: HashSet<u64> = catalog.bottles().iter().map(|b| b.id).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_derived_fields() {
        let catalog = Catalog::embedded().unwrap();

        let heaven_hill = catalog.get(13266).unwrap();
        assert_eq!(heaven_hill.region, Region::America);
        assert_eq!(heaven_hill.msrp, 47.74);
        assert_eq!(heaven_hill.flavor_profile.vanilla, 70.0);
        assert_eq!(heaven_hill.flavor_profile.spicy, 30.0);

        let gin = catalog.get(6462).unwrap();
        assert_eq!(gin.region, Region::Unknown);
        assert_eq!(gin.flavor_profile.fruity, 50.0);

        let stagg = catalog.get(11010).unwrap();
        assert_eq!(stagg.flavor_profile.spicy, 45.0);
    }

    #[test]
    fn test_reload_is_idempotent() {
        let first = Catalog::embedded().unwrap();
        let second = Catalog::embedded().unwrap();
        assert_eq!(first.bottles(), second.bottles());
    }

    #[test]
    fn test_shared_handle_is_reused() {
        let a = CatalogHandle::shared().unwrap();
        let b = CatalogHandle::shared().unwrap();
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let records = vec![
            CatalogRecord::new(1, "A", "Bourbon", 90.0, 30.0),
            CatalogRecord::new(1, "B", "Rye", 100.0, 40.0),
        ];
        assert!(matches!(
            Catalog::from_records(records),
            Err(CatalogError::DuplicateId(1))
        ));
    }

    #[test]
    fn test_corrupt_catalog_is_an_error() {
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(Catalog::from_json_str("[]"), Err(CatalogError::Empty)));
        assert!(matches!(
            Catalog::from_path("/nonexistent/bottles.json"),
            Err(CatalogError::Io { .. })
        ));
    }

    #[test]
    fn test_record_requires_msrp_and_strength() {
        let mut record = CatalogRecord::new(9, "No Price", "Bourbon", 90.0, 0.0);
        record.msrp = None;
        assert!(matches!(
            record.into_bottle(),
            Err(CatalogError::InvalidRecord { id: 9, .. })
        ));

        let json = r#"[{"id": 3, "name": "ABV Only", "spirit_type": "Irish Whiskey", "abv": 46.0, "avg_msrp": 55.0}]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let bottle = catalog.get(3).unwrap();
        assert_eq!(bottle.proof, 92.0);
        assert_eq!(bottle.region, Region::Ireland);
        assert_eq!(bottle.flavor_profile, FlavorVector::default());
    }

    #[test]
    fn test_explicit_region_wins() {
        let record = CatalogRecord::new(4, "Odd One", "Bourbon", 90.0, 30.0).with_region("Canada");
        assert_eq!(record.into_bottle().unwrap().region, Region::Canada);
    }

    #[test]
    fn test_lookups() {
        let catalog = Catalog::embedded().unwrap();

        let scotch = catalog.by_region(Region::Scotland);
        assert!(!scotch.is_empty());
        assert!(scotch.iter().all(|b| b.spirit_type.contains("Scotch")));

        let rye = catalog.by_spirit_type("rye");
        assert!(rye.iter().all(|b| b.spirit_type == "Rye"));
        assert!(!rye.is_empty());

        let cheap = catalog.by_price_range(25.0, 40.0);
        assert!(cheap.iter().all(|b| b.msrp >= 25.0 && b.msrp <= 40.0));
    }
}
