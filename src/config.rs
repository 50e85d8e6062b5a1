//! Engine configuration: parameter defaults and store bounds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Defaults applied when query parameters are missing or malformed, plus
/// limits on store access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Proximity radius when none (or garbage) is given.
    pub default_radius_km: f64,
    /// Minimum shared features for a graph edge.
    pub default_min_shared: u32,
    /// Edges returned when no limit is given.
    pub default_max_edges: usize,
    /// Hard ceiling on requested edge limits.
    pub max_edges_cap: usize,
    /// Upper bound on any single store call.
    pub store_timeout_ms: u64,
    /// Rows returned by the recent-samples listing.
    pub recent_samples_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 10.0,
            default_min_shared: 1,
            default_max_edges: 100,
            max_edges_cap: 1000,
            store_timeout_ms: 30_000,
            recent_samples_limit: 500,
        }
    }
}

impl EngineConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Parse from JSON; absent keys keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
