//! Graph export: serialize a similarity graph for other tools.
//!
//! Two formats:
//!
//! ```text
//! SimilarityGraph → export_cypher_dump() → MERGE statements
//!   → (:Sample {id, biome})-[:SHARED_ASV {count}]->(:Sample)
//!   → paste into Neo4j Browser or pipe into cypher-shell
//!
//! SimilarityGraph → ForceGraph → {nodes:[{id,biome}], links:[{source,target,value}]}
//!   → the shape force-directed graph widgets consume
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::Result;

/// Export a graph as a Cypher script.
///
/// Nodes are merged by id so the script is safe to re-run. Each edge is
/// written once, from `source` to `target`; readers should match it
/// undirected.
pub fn export_cypher_dump(graph: &SimilarityGraph, writer: &mut dyn Write) -> Result<()> {
    // Header
    writeln!(writer, "// asv-graph Cypher DUMP")?;
    writeln!(writer, "// Nodes: {}", graph.nodes.len())?;
    writeln!(writer, "// Relationships: {}", graph.edges.len())?;
    writeln!(writer)?;

    for node in &graph.nodes {
        match &node.biome {
            Some(biome) => writeln!(
                writer,
                "MERGE (s:Sample {{id: {}}}) SET s.biome = {};",
                quote(node.id.as_str()),
                quote(biome),
            )?,
            None => writeln!(writer, "MERGE (s:Sample {{id: {}}});", quote(node.id.as_str()))?,
        }
    }

    writeln!(writer)?;
    writeln!(writer, "// Relationships")?;

    for edge in &graph.edges {
        writeln!(
            writer,
            "MATCH (a:Sample {{id: {}}}), (b:Sample {{id: {}}}) MERGE (a)-[r:SHARED_ASV]->(b) SET r.count = {};",
            quote(edge.source.as_str()),
            quote(edge.target.as_str()),
            edge.shared,
        )?;
    }

    Ok(())
}

/// Format a string as a Cypher literal.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

// ============================================================================
// Force-graph JSON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceNode {
    pub id: SampleId,
    pub biome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceLink {
    pub source: SampleId,
    pub target: SampleId,
    pub value: u32,
}

/// `{nodes, links}` as force-directed graph widgets expect it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceGraph {
    pub nodes: Vec<ForceNode>,
    pub links: Vec<ForceLink>,
}

impl From<&SimilarityGraph> for ForceGraph {
    fn from(graph: &SimilarityGraph) -> Self {
        Self {
            nodes: graph
                .nodes
                .iter()
                .map(|n| ForceNode { id: n.id.clone(), biome: n.biome.clone() })
                .collect(),
            links: graph
                .edges
                .iter()
                .map(|e| ForceLink { source: e.source.clone(), target: e.target.clone(), value: e.shared })
                .collect(),
        }
    }
}

/// Write a graph as pretty-printed force-graph JSON.
pub fn export_force_graph_json(graph: &SimilarityGraph, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &ForceGraph::from(graph))?;
    writeln!(writer)?;
    Ok(())
}
