//! Derived similarity relation between samples.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{FeatureId, SampleId};

/// An undirected weighted edge: two samples sharing `shared` features.
///
/// Stored canonically with `source < target`; the relation is symmetric,
/// so lookups from either endpoint see the same weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub source: SampleId,
    pub target: SampleId,
    pub shared: u32,
}

impl SimilarityEdge {
    /// Build an edge, ordering the endpoints canonically.
    pub fn new(a: SampleId, b: SampleId, shared: u32) -> Self {
        if a <= b {
            Self { source: a, target: b, shared }
        } else {
            Self { source: b, target: a, shared }
        }
    }

    pub fn touches(&self, id: &SampleId) -> bool {
        &self.source == id || &self.target == id
    }

    /// The endpoint opposite `from`, or None if `from` is not on this edge.
    pub fn other(&self, from: &SampleId) -> Option<&SampleId> {
        if from == &self.source { Some(&self.target) }
        else if from == &self.target { Some(&self.source) }
        else { None }
    }

    pub fn connects(&self, a: &SampleId, b: &SampleId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}

/// A graph node: a sample that has at least one qualifying edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: SampleId,
    pub biome: Option<String>,
}

/// Nodes and edges of a co-occurrence graph.
///
/// Edges are ordered by `shared` descending, then by endpoint ids.
/// Nodes are ordered by id and are exactly the edge endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<SimilarityEdge>,
}

impl SimilarityGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Weight between two samples, regardless of argument order.
    pub fn weight(&self, a: &SampleId, b: &SampleId) -> Option<u32> {
        self.edges.iter().find(|e| e.connects(a, b)).map(|e| e.shared)
    }

    pub fn edges_of<'a>(&'a self, id: &'a SampleId) -> impl Iterator<Item = &'a SimilarityEdge> + 'a {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    /// Every sample joined to `id` by an edge, in either direction, deduplicated, in edge order.
    pub fn neighbors_of(&self, id: &SampleId) -> Vec<SampleId> {
        let mut seen = BTreeSet::new();
        self.edges_of(id)
            .filter_map(|e| e.other(id))
            .filter(|n| seen.insert((*n).clone()))
            .cloned()
            .collect()
    }

    pub fn contains_node(&self, id: &SampleId) -> bool {
        self.nodes.binary_search_by(|n| n.id.cmp(id)).is_ok()
    }
}

/// Literal shared features between a focal sample and one neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborShare {
    pub neighbor: SampleId,
    #[serde(rename = "sequences")]
    pub shared_features: Vec<FeatureId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SampleId { SampleId::from(s) }

    #[test]
    fn test_edge_is_canonical() {
        let e = SimilarityEdge::new(id("b"), id("a"), 3);
        assert_eq!(e.source, id("a"));
        assert_eq!(e.target, id("b"));
        assert_eq!(e.other(&id("a")), Some(&id("b")));
        assert_eq!(e.other(&id("b")), Some(&id("a")));
        assert_eq!(e.other(&id("c")), None);
    }

    #[test]
    fn test_weight_is_symmetric() {
        let g = SimilarityGraph {
            nodes: vec![],
            edges: vec![SimilarityEdge::new(id("a"), id("b"), 2)],
        };
        assert_eq!(g.weight(&id("a"), &id("b")), Some(2));
        assert_eq!(g.weight(&id("b"), &id("a")), Some(2));
        assert_eq!(g.weight(&id("a"), &id("c")), None);
    }

    #[test]
    fn test_neighbors_from_both_directions() {
        let g = SimilarityGraph {
            nodes: vec![],
            edges: vec![
                SimilarityEdge::new(id("a"), id("m"), 3),
                SimilarityEdge::new(id("m"), id("z"), 2),
                SimilarityEdge::new(id("x"), id("y"), 1),
            ],
        };
        assert_eq!(g.neighbors_of(&id("m")), vec![id("a"), id("z")]);
        assert!(g.neighbors_of(&id("q")).is_empty());
    }
}
