//! Co-occurrence graph builder.
//!
//! ```text
//! samples ─(category filter)─▶ FeatureIndex ─▶ pair counts
//!        ─(shared ≥ min)─▶ rank by shared desc, ids asc ─▶ top max_edges
//!        ─▶ nodes = edge endpoints
//! ```

use std::collections::BTreeSet;
use std::cmp::Ordering;

use tracing::debug;

use crate::index::FeatureIndex;
use crate::model::*;

/// Build the similarity graph over `samples`.
///
/// Only samples matching `filter` take part. Pairs sharing fewer than
/// `min_shared` features are dropped (`0` behaves like `1`). The strongest
/// `max_edges` pairs survive; ties are broken by the canonical pair ids so
/// the cut is deterministic. Samples without a surviving edge are not nodes.
pub fn build_graph(
    samples: &[Sample],
    filter: Option<&CategoryFilter>,
    min_shared: u32,
    max_edges: usize,
) -> SimilarityGraph {
    if max_edges == 0 {
        return SimilarityGraph::empty();
    }
    let min_shared = min_shared.max(1);

    let index = FeatureIndex::build(
        samples.iter().filter(|s| filter.is_none_or(|f| f.matches(s))),
    );
    debug!(
        samples = index.sample_count(),
        features = index.feature_count(),
        max_postings = index.max_postings_len(),
        pair_work = index.pair_work(),
        "built feature index"
    );

    let mut pairs: Vec<(u32, u32, u32)> = index
        .pair_counts()
        .into_iter()
        .filter(|&(_, shared)| shared >= min_shared)
        .map(|((lo, hi), shared)| (shared, lo, hi))
        .collect();

    let rank = |x: &(u32, u32, u32), y: &(u32, u32, u32)| -> Ordering {
        y.0.cmp(&x.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2))
    };
    if pairs.len() > max_edges {
        pairs.select_nth_unstable_by(max_edges - 1, rank);
        pairs.truncate(max_edges);
    }
    pairs.sort_unstable_by(rank);

    let mut endpoints = BTreeSet::new();
    let edges = pairs
        .iter()
        .map(|&(shared, lo, hi)| {
            endpoints.insert(lo);
            endpoints.insert(hi);
            SimilarityEdge::new(index.sample(lo).id.clone(), index.sample(hi).id.clone(), shared)
        })
        .collect();

    // slots ascend with ids, so the set iterates in id order
    let nodes = endpoints
        .into_iter()
        .map(|slot| {
            let sample = index.sample(slot);
            GraphNode {
                id: sample.id.clone(),
                biome: sample.category(CategoryField::Biome).map(str::to_owned),
            }
        })
        .collect();

    SimilarityGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn abc() -> Vec<Sample> {
        vec![
            Sample::new("A").with_biome("soil").with_features(["x1", "x2", "x3"]),
            Sample::new("B").with_biome("soil").with_features(["x2", "x3", "x4"]),
            Sample::new("C").with_biome("water").with_features(["x5"]),
        ]
    }

    #[test]
    fn test_single_edge_no_isolated_nodes() {
        let g = build_graph(&abc(), None, 2, 100);
        assert_eq!(g.edges, vec![SimilarityEdge::new("A".into(), "B".into(), 2)]);
        let ids: Vec<&str> = g.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(g.nodes[0].biome.as_deref(), Some("soil"));
    }

    #[test]
    fn test_threshold_above_every_pair() {
        assert!(build_graph(&abc(), None, 3, 100).is_empty());
    }

    #[test]
    fn test_zero_min_shared_behaves_like_one() {
        assert_eq!(build_graph(&abc(), None, 0, 100), build_graph(&abc(), None, 1, 100));
    }

    #[test]
    fn test_max_edges_zero() {
        let g = build_graph(&abc(), None, 1, 0);
        assert!(g.nodes.is_empty() && g.edges.is_empty());
    }

    #[test]
    fn test_filter_applies_before_join() {
        let mut samples = abc();
        samples.push(Sample::new("D").with_biome("water").with_features(["x1", "x2", "x3"]));

        let water = build_graph(&samples, Some(&CategoryFilter::biome("water")), 1, 100);
        assert!(water.is_empty());

        let soil = build_graph(&samples, Some(&CategoryFilter::biome("soil")), 1, 100);
        assert_eq!(soil.edges.len(), 1);
        assert!(!soil.contains_node(&"D".into()));
    }

    #[test]
    fn test_truncation_is_ordered_and_deterministic() {
        // a star: hub shares 3 with h3, 2 with h2a/h2b, 1 with h1
        let samples = vec![
            Sample::new("hub").with_features(["f1", "f2", "f3"]),
            Sample::new("h3").with_features(["f1", "f2", "f3"]),
            Sample::new("h2b").with_features(["f1", "f2"]),
            Sample::new("h2a").with_features(["f2", "f3"]),
            Sample::new("h1").with_features(["f3"]),
        ];
        let g = build_graph(&samples, None, 2, 3);
        assert_eq!(g.edges.len(), 3);
        assert!(g.edges.windows(2).all(|w| w[0].shared >= w[1].shared));
        assert_eq!(g.edges[0], SimilarityEdge::new("h3".into(), "hub".into(), 3));
        // four pairs share 2; the cut keeps the two smallest by (source, target)
        assert_eq!(g.edges[1], SimilarityEdge::new("h2a".into(), "h3".into(), 2));
        assert_eq!(g.edges[2], SimilarityEdge::new("h2a".into(), "hub".into(), 2));
        let g_again = build_graph(&samples, None, 2, 3);
        assert_eq!(g, g_again);
    }
}
