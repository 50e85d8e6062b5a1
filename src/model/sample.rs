//! Sample: a geolocated specimen with its top-K feature set.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;

use super::{FeatureId, GeoPoint};

/// Maximum number of features kept per sample.
pub const TOP_K: usize = 5;

/// Category bucket for samples whose attribute is missing or blank.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Opaque sample identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SampleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SampleId {
    fn from(v: &str) -> Self { Self(v.to_owned()) }
}

impl From<String> for SampleId {
    fn from(v: String) -> Self { Self(v) }
}

// ============================================================================
// FeatureSet
// ============================================================================

/// The top-K features of a sample.
///
/// Always a set: duplicates are dropped on construction (first occurrence
/// wins, order preserved) and at most [`TOP_K`] entries are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet(SmallVec<[FeatureId; TOP_K]>);

impl FeatureSet {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Insert a feature. Returns false if it was already present or the set is full.
    pub fn insert(&mut self, feature: FeatureId) -> bool {
        if self.0.len() >= TOP_K || self.0.contains(&feature) {
            return false;
        }
        self.0.push(feature);
        true
    }

    pub fn contains(&self, feature: &FeatureId) -> bool {
        self.0.contains(feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureId> {
        self.0.iter()
    }

    /// Features present in both sets, in `self`'s order.
    pub fn intersection(&self, other: &FeatureSet) -> Vec<FeatureId> {
        self.0.iter().filter(|f| other.contains(f)).cloned().collect()
    }

    /// `|self ∩ other|`
    pub fn shared_count(&self, other: &FeatureSet) -> usize {
        self.0.iter().filter(|f| other.contains(f)).count()
    }
}

impl<F: Into<FeatureId>> FromIterator<F> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for feature in iter {
            set.insert(feature.into());
        }
        set
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a FeatureId;
    type IntoIter = std::slice::Iter<'a, FeatureId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for FeatureSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<FeatureId>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Which categorical attribute of a sample a filter or breakdown refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryField {
    /// EMP `env_biome`.
    Biome,
    /// EMP `env_feature`.
    EnvFeature,
}

/// Keep only samples whose `field` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub field: CategoryField,
    pub value: String,
}

impl CategoryFilter {
    pub fn new(field: CategoryField, value: impl Into<String>) -> Self {
        Self { field, value: value.into() }
    }

    pub fn biome(value: impl Into<String>) -> Self {
        Self::new(CategoryField::Biome, value)
    }

    pub fn env_feature(value: impl Into<String>) -> Self {
        Self::new(CategoryField::EnvFeature, value)
    }

    pub fn matches(&self, sample: &Sample) -> bool {
        sample.category(self.field) == Some(self.value.as_str())
    }
}

// ============================================================================
// Sample
// ============================================================================

/// A geolocated biological sample.
///
/// Field aliases accept the dashboard's JSON sample export directly
/// (`env_biome`, `top5_asv`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, alias = "top5_asv")]
    pub features: FeatureSet,
    #[serde(default, alias = "env_biome")]
    pub biome: Option<String>,
    #[serde(default)]
    pub env_feature: Option<String>,
    #[serde(default)]
    pub sample_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Sample {
    pub fn new(id: impl Into<SampleId>) -> Self {
        Self {
            id: id.into(),
            latitude: None,
            longitude: None,
            features: FeatureSet::new(),
            biome: None,
            env_feature: None,
            sample_type: None,
            description: None,
            created_at: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_features<F: Into<FeatureId>>(mut self, features: impl IntoIterator<Item = F>) -> Self {
        self.features = features.into_iter().collect();
        self
    }

    pub fn with_biome(mut self, biome: impl Into<String>) -> Self {
        self.biome = Some(biome.into());
        self
    }

    pub fn with_env_feature(mut self, env_feature: impl Into<String>) -> Self {
        self.env_feature = Some(env_feature.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// The sample's coordinate, if both halves are present and in range.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => GeoPoint::new(lat, lon).ok(),
            _ => None,
        }
    }

    /// Value of a categorical attribute. Blank values count as absent.
    pub fn category(&self, field: CategoryField) -> Option<&str> {
        let raw = match field {
            CategoryField::Biome => self.biome.as_deref(),
            CategoryField::EnvFeature => self.env_feature.as_deref(),
        };
        raw.filter(|v| !v.trim().is_empty())
    }

    /// Like [`Sample::category`], falling back to [`UNKNOWN_CATEGORY`].
    pub fn category_or_unknown(&self, field: CategoryField) -> &str {
        self.category(field).unwrap_or(UNKNOWN_CATEGORY)
    }
}
