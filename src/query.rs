//! Typed query objects.
//!
//! Raw string parameters are parsed and validated here, once, at the
//! boundary. The algorithms only ever see these structs.
//!
//! | Query | Required | Optional (default) |
//! |-------|----------|--------------------|
//! | `ProximityQuery` | `lat`, `lon` (or `lng`) | `radius` (10 km), `feature` |
//! | `GraphQuery` | none | `biome`, `minCount` (1), `limitPairs` (100, capped) |
//! | `NeighborQuery` | `sampleId` | `neighbors` (comma separated) |
//! | `TaxonomyQuery` | none | `asvSeqs` |
//!
//! A malformed optional parameter falls back to its default. A missing or
//! malformed required one is `Error::InvalidInput`.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::*;
use crate::{Error, Result};

/// Raw request parameters, e.g. an HTTP query string.
pub type QueryParams = HashMap<String, String>;

fn param<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required<T: FromStr>(params: &QueryParams, keys: &[&str]) -> Result<T> {
    let (key, raw) = keys
        .iter()
        .find_map(|k| param(params, k).map(|v| (*k, v)))
        .ok_or_else(|| Error::InvalidInput(format!("missing required parameter '{}'", keys[0])))?;
    raw.parse()
        .map_err(|_| Error::InvalidInput(format!("parameter '{key}' is not valid: {raw:?}")))
}

fn optional<T: FromStr>(params: &QueryParams, key: &str, accept: impl Fn(&T) -> bool) -> Option<T> {
    let raw = param(params, key)?;
    match raw.parse::<T>() {
        Ok(v) if accept(&v) => Some(v),
        _ => {
            debug!(key, raw, "ignoring malformed parameter, using default");
            None
        }
    }
}

// ============================================================================
// Proximity
// ============================================================================

/// Samples near a point, optionally restricted to one `env_feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityQuery {
    pub point: GeoPoint,
    pub radius_km: f64,
    pub feature: Option<String>,
}

impl ProximityQuery {
    pub fn new(point: GeoPoint, radius_km: f64) -> Result<Self> {
        let query = Self { point, radius_km, feature: None };
        query.validate()?;
        Ok(query)
    }

    /// Fields are public, so the engine re-checks before touching the store.
    pub fn validate(&self) -> Result<()> {
        GeoPoint::new(self.point.lat, self.point.lon)?;
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(Error::InvalidInput(format!("radius must be positive, got {}", self.radius_km)));
        }
        Ok(())
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn from_params(params: &QueryParams, config: &EngineConfig) -> Result<Self> {
        let lat: f64 = required(params, &["lat"])?;
        let lon: f64 = required(params, &["lon", "lng"])?;
        let point = GeoPoint::new(lat, lon)?;
        let radius = optional(params, "radius", |r: &f64| r.is_finite() && *r > 0.0)
            .unwrap_or(config.default_radius_km);

        let mut query = Self::new(point, radius)?;
        query.feature = param(params, "feature").map(str::to_owned);
        Ok(query)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Global co-occurrence graph parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQuery {
    pub filter: Option<CategoryFilter>,
    pub min_shared: u32,
    pub max_edges: usize,
}

impl GraphQuery {
    pub fn new(min_shared: u32, max_edges: usize) -> Self {
        Self { filter: None, min_shared: min_shared.max(1), max_edges }
    }

    pub fn with_filter(mut self, filter: CategoryFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.default_min_shared, config.default_max_edges.min(config.max_edges_cap))
    }

    pub fn from_params(params: &QueryParams, config: &EngineConfig) -> Result<Self> {
        let min_shared = optional(params, "minCount", |n: &u32| *n >= 1)
            .unwrap_or(config.default_min_shared);
        let max_edges = optional(params, "limitPairs", |_: &usize| true)
            .unwrap_or(config.default_max_edges)
            .min(config.max_edges_cap);

        let mut query = Self::new(min_shared, max_edges);
        query.filter = param(params, "biome").map(CategoryFilter::biome);
        Ok(query)
    }
}

// ============================================================================
// Neighbor detail
// ============================================================================

/// Shared features between one sample and a set of neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborQuery {
    pub focal: SampleId,
    pub neighbors: Vec<SampleId>,
}

impl NeighborQuery {
    pub fn new(focal: impl Into<SampleId>, neighbors: impl IntoIterator<Item = SampleId>) -> Result<Self> {
        let mut seen = HashSet::new();
        let neighbors = neighbors
            .into_iter()
            .filter(|n| !n.as_str().is_empty() && seen.insert(n.clone()))
            .collect();
        let query = Self { focal: focal.into(), neighbors };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<()> {
        if self.focal.as_str().trim().is_empty() {
            return Err(Error::InvalidInput("focal sample id is empty".into()));
        }
        Ok(())
    }

    pub fn from_params(params: &QueryParams) -> Result<Self> {
        let focal = param(params, "sampleId")
            .ok_or_else(|| Error::InvalidInput("missing required parameter 'sampleId'".into()))?;
        let neighbors = param(params, "neighbors")
            .map(parse_id_list)
            .unwrap_or_default();
        Self::new(focal, neighbors)
    }
}

/// Split a comma-delimited id list, dropping blank entries.
pub fn parse_id_list(raw: &str) -> Vec<SampleId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SampleId::from)
        .collect()
}

// ============================================================================
// Taxonomy
// ============================================================================

/// Batch taxonomy lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyQuery {
    #[serde(rename = "asvSeqs", default)]
    pub features: Vec<FeatureId>,
}

impl TaxonomyQuery {
    pub fn new(features: impl IntoIterator<Item = FeatureId>) -> Self {
        Self { features: features.into_iter().collect() }
    }
}
