//! # Sample / Feature Model
//!
//! Plain DTOs shared by the store, the algorithms, and callers.
//!
//! Design rule: this module is pure data. No I/O, no async.
//! Edges and neighbor shares are derived on demand and never persisted.

pub mod sample;
pub mod feature;
pub mod geo;
pub mod edge;

pub use sample::{
    Sample, SampleId, FeatureSet, CategoryField, CategoryFilter,
    TOP_K, UNKNOWN_CATEGORY,
};
pub use feature::{FeatureId, TaxonomyRecord};
pub use geo::{GeoPoint, EARTH_RADIUS_KM, haversine_km};
pub use edge::{SimilarityEdge, SimilarityGraph, GraphNode, NeighborShare};
