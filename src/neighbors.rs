//! Neighbor detail: the literal features behind each edge weight.

use std::collections::{BTreeMap, HashMap};

use crate::model::*;

/// Shared features between `focal` and each requested neighbor.
///
/// `known` holds whatever samples the store returned for `neighbor_ids`.
/// Ids with no sample in `known`, and the focal id itself, are left out of
/// the result rather than reported. A neighbor that exists but shares
/// nothing maps to an empty list. Features keep `focal`'s order.
pub fn resolve_shared(
    focal: &Sample,
    neighbor_ids: &[SampleId],
    known: &[Sample],
) -> BTreeMap<SampleId, Vec<FeatureId>> {
    let by_id: HashMap<&SampleId, &Sample> = known.iter().map(|s| (&s.id, s)).collect();

    neighbor_ids
        .iter()
        .filter(|id| **id != focal.id)
        .filter_map(|id| by_id.get(id).copied())
        .map(|neighbor| (neighbor.id.clone(), focal.features.intersection(&neighbor.features)))
        .collect()
}

/// Flatten a resolver result into response records.
pub fn into_shares(resolved: BTreeMap<SampleId, Vec<FeatureId>>) -> Vec<NeighborShare> {
    resolved
        .into_iter()
        .map(|(neighbor, shared_features)| NeighborShare { neighbor, shared_features })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<SampleId> {
        raw.iter().map(|s| SampleId::from(*s)).collect()
    }

    #[test]
    fn test_unknown_neighbor_is_omitted() {
        let a = Sample::new("A").with_features(["x1", "x2", "x3"]);
        let b = Sample::new("B").with_features(["x3", "x2", "x4"]);
        let out = resolve_shared(&a, &ids(&["B", "Z"]), &[b]);

        assert_eq!(out.len(), 1);
        let shared: Vec<&str> = out[&SampleId::from("B")].iter().map(|f| f.as_str()).collect();
        assert_eq!(shared, vec!["x2", "x3"]);
    }

    #[test]
    fn test_empty_request() {
        let a = Sample::new("A").with_features(["x1"]);
        assert!(resolve_shared(&a, &[], &[]).is_empty());
    }

    #[test]
    fn test_focal_and_disjoint_neighbors() {
        let a = Sample::new("A").with_features(["x1"]);
        let c = Sample::new("C").with_features(["x9"]);
        let out = resolve_shared(&a, &ids(&["A", "C"]), &[a.clone(), c]);
        assert_eq!(out.len(), 1);
        assert!(out[&SampleId::from("C")].is_empty());
    }

    #[test]
    fn test_into_shares_keeps_id_order() {
        let a = Sample::new("A").with_features(["x1"]);
        let known = vec![
            Sample::new("Z").with_features(["x1"]),
            Sample::new("M").with_features(["x1"]),
        ];
        let shares = into_shares(resolve_shared(&a, &ids(&["Z", "M"]), &known));
        assert_eq!(shares[0].neighbor.as_str(), "M");
        assert_eq!(shares[1].neighbor.as_str(), "Z");
    }
}
