//! Proximity search and feature aggregation around a point.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::{Error, Result};

/// Occurrence of one feature among the considered samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCount {
    pub feature: FeatureId,
    pub total: u32,
    /// Category value (or `"unknown"`) → number of samples.
    pub breakdown: BTreeMap<String, u32>,
}

/// Aggregated feature occurrence over a set of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProfile {
    /// Samples that passed the category filter.
    pub samples_considered: usize,
    /// Sorted by `total` descending, then feature id ascending.
    pub rows: Vec<FeatureCount>,
}

impl FeatureProfile {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Share of considered samples carrying the row's feature, in percent.
    pub fn percentage(&self, row: &FeatureCount) -> f64 {
        if self.samples_considered == 0 {
            return 0.0;
        }
        row.total as f64 / self.samples_considered as f64 * 100.0
    }

    pub fn get(&self, feature: &FeatureId) -> Option<&FeatureCount> {
        self.rows.iter().find(|r| &r.feature == feature)
    }

    pub fn features(&self) -> Vec<FeatureId> {
        self.rows.iter().map(|r| r.feature.clone()).collect()
    }
}

/// Samples within `radius_km` of `point` (inclusive), in input order.
///
/// Samples without a usable coordinate are skipped.
pub fn find_nearby<'a>(
    point: &GeoPoint,
    radius_km: f64,
    samples: &'a [Sample],
) -> Result<Vec<&'a Sample>> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(Error::InvalidInput(format!("radius must be positive, got {radius_km}")));
    }
    Ok(samples
        .iter()
        .filter(|s| {
            s.location()
                .is_some_and(|loc| point.distance_km(&loc) <= radius_km)
        })
        .collect())
}

/// Re-order nearby samples by distance from `point`, closest first.
pub fn sort_by_distance(point: &GeoPoint, samples: &mut [&Sample]) {
    samples.sort_by(|a, b| {
        let da = a.location().map_or(f64::INFINITY, |l| point.distance_km(&l));
        let db = b.location().map_or(f64::INFINITY, |l| point.distance_km(&l));
        da.total_cmp(&db).then_with(|| a.id.cmp(&b.id))
    });
}

/// Count feature occurrences, broken down by the `field` category.
///
/// With `filter` set, samples whose `field` differs are skipped entirely.
pub fn aggregate_features<'a>(
    samples: impl IntoIterator<Item = &'a Sample>,
    field: CategoryField,
    filter: Option<&str>,
) -> FeatureProfile {
    let mut considered = 0usize;
    let mut counts: HashMap<&FeatureId, (u32, BTreeMap<String, u32>)> = HashMap::new();

    for sample in samples {
        if let Some(wanted) = filter {
            if sample.category(field) != Some(wanted) {
                continue;
            }
        }
        considered += 1;

        let category = sample.category_or_unknown(field);
        for feature in &sample.features {
            let (total, breakdown) = counts.entry(feature).or_default();
            *total += 1;
            *breakdown.entry(category.to_owned()).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<FeatureCount> = counts
        .into_iter()
        .map(|(feature, (total, breakdown))| FeatureCount {
            feature: feature.clone(),
            total,
            breakdown,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.feature.cmp(&b.feature)));

    FeatureProfile { samples_considered: considered, rows }
}
