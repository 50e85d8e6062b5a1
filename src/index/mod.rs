//! Inverted feature index.
//!
//! Maps every feature to the postings list of samples that carry it and
//! counts co-occurring pairs by walking each list, so the cost is
//! `O(Σ_f s_f²)` over features `f` held by `s_f` samples instead of a
//! full pairwise scan.
//!
//! Samples get dense `u32` slots in ascending id order. A postings list is
//! therefore sorted and duplicate-free, and comparing slots is the same as
//! comparing sample ids.

use hashbrown::HashMap;

use crate::model::{FeatureId, Sample};

/// Feature → samples index over one snapshot of samples.
#[derive(Debug)]
pub struct FeatureIndex<'a> {
    samples: Vec<&'a Sample>,
    postings: HashMap<&'a FeatureId, Vec<u32>>,
}

impl<'a> FeatureIndex<'a> {
    /// Index the given samples. Repeated ids keep their first occurrence.
    pub fn build(samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let mut samples: Vec<&'a Sample> = samples.into_iter().collect();
        samples.sort_by(|a, b| a.id.cmp(&b.id));
        samples.dedup_by(|later, earlier| later.id == earlier.id);

        let mut postings: HashMap<&'a FeatureId, Vec<u32>> = HashMap::new();
        for (slot, sample) in samples.iter().enumerate() {
            for feature in &sample.features {
                postings.entry(feature).or_default().push(slot as u32);
            }
        }

        Self { samples, postings }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn feature_count(&self) -> usize {
        self.postings.len()
    }

    pub fn sample(&self, slot: u32) -> &'a Sample {
        self.samples[slot as usize]
    }

    /// Samples carrying `feature`, as slots.
    pub fn postings(&self, feature: &FeatureId) -> &[u32] {
        self.postings.get(feature).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Length of the longest postings list. A single very common feature
    /// dominates the cost of [`FeatureIndex::pair_counts`].
    pub fn max_postings_len(&self) -> usize {
        self.postings.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of pair increments `pair_counts` will perform.
    pub fn pair_work(&self) -> u64 {
        self.postings
            .values()
            .map(|p| {
                let n = p.len() as u64;
                n * n.saturating_sub(1) / 2
            })
            .sum()
    }

    /// Shared-feature count for every pair of samples with at least one
    /// feature in common, keyed by `(lo, hi)` slots with `lo < hi`.
    pub fn pair_counts(&self) -> HashMap<(u32, u32), u32> {
        let mut counts: HashMap<(u32, u32), u32> = HashMap::new();
        for list in self.postings.values() {
            for (i, &lo) in list.iter().enumerate() {
                for &hi in &list[i + 1..] {
                    *counts.entry((lo, hi)).or_insert(0) += 1;
                }
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new("C").with_features(["x5"]),
            Sample::new("A").with_features(["x1", "x2", "x3"]),
            Sample::new("B").with_features(["x2", "x3", "x4"]),
        ]
    }

    #[test]
    fn test_slots_follow_id_order() {
        let data = samples();
        let idx = FeatureIndex::build(&data);
        assert_eq!(idx.sample_count(), 3);
        assert_eq!(idx.sample(0).id.as_str(), "A");
        assert_eq!(idx.sample(2).id.as_str(), "C");
        assert_eq!(idx.feature_count(), 5);
        assert_eq!(idx.postings(&FeatureId::from("x2")), &[0, 1]);
        assert!(idx.postings(&FeatureId::from("nope")).is_empty());
    }

    #[test]
    fn test_pair_counts() {
        let data = samples();
        let idx = FeatureIndex::build(&data);
        let counts = idx.pair_counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&(0, 1)), Some(&2));
        assert_eq!(idx.pair_work(), 2);
        assert_eq!(idx.max_postings_len(), 2);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let data = vec![
            Sample::new("A").with_features(["x1"]),
            Sample::new("A").with_features(["x9"]),
            Sample::new("B").with_features(["x1"]),
        ];
        let idx = FeatureIndex::build(&data);
        assert_eq!(idx.sample_count(), 2);
        assert_eq!(idx.pair_counts().get(&(0, 1)), Some(&1));
    }
}
