//! # asv-graph: Sample Co-occurrence & Similarity Graph Engine
//!
//! Finds microbiome samples near a point and aggregates the ASVs they carry,
//! builds a global weighted graph of samples that share ASVs, and drills
//! down from an edge to the literal shared ASVs.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `SampleStore` is the contract between the engine and storage
//! 2. **Clean DTOs**: `Sample`, `SimilarityEdge`, `SimilarityGraph` cross all boundaries
//! 3. **Pure algorithms**: proximity, graph building and neighbor resolution are plain functions
//! 4. **Validate once**: raw parameters become typed queries before any store access
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use asv_graph::{Engine, GraphQuery, Sample};
//! use asv_graph::storage::MemoryBackend;
//!
//! # async fn example() -> asv_graph::Result<()> {
//! let store = MemoryBackend::from_samples([
//!     Sample::new("A").with_features(["x1", "x2", "x3"]),
//!     Sample::new("B").with_features(["x2", "x3", "x4"]),
//! ]);
//! let engine = Engine::with_store(store);
//!
//! let graph = engine.similarity_graph(&GraphQuery::new(2, 100)).await?;
//! for edge in &graph.edges {
//!     println!("{} -- {} ({})", edge.source, edge.target, edge.shared);
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod index;
pub mod proximity;
pub mod similarity;
pub mod neighbors;
pub mod taxonomy;
pub mod query;
pub mod config;
pub mod storage;
pub mod tx;
pub mod export;
#[cfg(feature = "http")]
pub mod http;

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{
    Sample, SampleId, FeatureId, FeatureSet, GeoPoint,
    CategoryField, CategoryFilter, TaxonomyRecord,
    SimilarityEdge, SimilarityGraph, GraphNode, NeighborShare,
};
pub use storage::{SampleStore, BackendConfig};
pub use taxonomy::{TaxonomyStore, MemoryTaxonomy, NoTaxonomy};
pub use query::{ProximityQuery, GraphQuery, NeighborQuery, TaxonomyQuery, QueryParams};
pub use proximity::{FeatureCount, FeatureProfile};
pub use config::EngineConfig;
pub use tx::{Transaction, TxId};

// ============================================================================
// Engine handle
// ============================================================================

/// The primary entry point. An `Engine` wraps an injected sample store and
/// taxonomy source and answers queries over them.
///
/// The engine holds no per-request state; share it behind an `Arc`.
pub struct Engine<B: SampleStore, T: TaxonomyStore = NoTaxonomy> {
    store: B,
    taxonomy: T,
    config: EngineConfig,
}

/// Aggregated features around a point, with taxonomy for each one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyProfile {
    pub nearby_samples: usize,
    pub profile: FeatureProfile,
    pub taxonomy: BTreeMap<FeatureId, Option<TaxonomyRecord>>,
}

impl<B: SampleStore> Engine<B, NoTaxonomy> {
    /// Create an engine with no taxonomy source.
    pub fn with_store(store: B) -> Self {
        Self { store, taxonomy: NoTaxonomy, config: EngineConfig::default() }
    }
}

impl<B: SampleStore, T: TaxonomyStore> Engine<B, T> {
    /// Swap in a taxonomy source.
    pub fn with_taxonomy<T2: TaxonomyStore>(self, taxonomy: T2) -> Engine<B, T2> {
        Engine { store: self.store, taxonomy, config: self.config }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn taxonomy(&self) -> &T {
        &self.taxonomy
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Samples within the query radius, closest first.
    #[tracing::instrument(skip(self), fields(lat = query.point.lat, lon = query.point.lon))]
    pub async fn nearby(&self, query: &ProximityQuery) -> Result<Vec<Sample>> {
        query.validate()?;
        let tx = self.begin().await?;
        let outcome = self.bounded(self.store.located_samples(&tx)).await;
        let located = self.finish(tx, outcome).await?;

        let mut hits = proximity::find_nearby(&query.point, query.radius_km, &located)?;
        proximity::sort_by_distance(&query.point, &mut hits);
        Ok(hits.into_iter().cloned().collect())
    }

    /// Feature profile of the samples around a point, enriched with taxonomy.
    #[tracing::instrument(skip(self), fields(lat = query.point.lat, lon = query.point.lon))]
    pub async fn nearby_profile(&self, query: &ProximityQuery) -> Result<NearbyProfile> {
        query.validate()?;
        let tx = self.begin().await?;
        let outcome = self.bounded(self.store.located_samples(&tx)).await;
        let located = self.finish(tx, outcome).await?;

        let hits = proximity::find_nearby(&query.point, query.radius_km, &located)?;
        let profile = proximity::aggregate_features(
            hits.iter().copied(),
            CategoryField::EnvFeature,
            query.feature.as_deref(),
        );
        let taxonomy = self.bounded(self.taxonomy.resolve(&profile.features())).await?;

        Ok(NearbyProfile { nearby_samples: hits.len(), profile, taxonomy })
    }

    /// Global co-occurrence graph.
    #[tracing::instrument(skip(self))]
    pub async fn similarity_graph(&self, query: &GraphQuery) -> Result<SimilarityGraph> {
        let tx = self.begin().await?;
        let outcome = match &query.filter {
            Some(filter) => self.bounded(self.store.samples_by_category(&tx, filter)).await,
            None => self.bounded(self.store.all_samples(&tx)).await,
        };
        let samples = self.finish(tx, outcome).await?;

        let max_edges = query.max_edges.min(self.config.max_edges_cap);
        let graph = similarity::build_graph(
            &samples,
            query.filter.as_ref(),
            query.min_shared,
            max_edges,
        );
        info!(
            samples = samples.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "similarity graph built"
        );
        Ok(graph)
    }

    /// Literal shared features between the focal sample and each neighbor.
    ///
    /// An empty neighbor list answers with an empty map without touching the
    /// store. Otherwise an unknown focal id is `Error::UnknownIdentifier`,
    /// while unknown neighbor ids are simply absent from the result.
    #[tracing::instrument(skip(self), fields(focal = %query.focal, neighbors = query.neighbors.len()))]
    pub async fn shared_features(
        &self,
        query: &NeighborQuery,
    ) -> Result<BTreeMap<SampleId, Vec<FeatureId>>> {
        query.validate()?;
        if query.neighbors.is_empty() {
            return Ok(BTreeMap::new());
        }

        let tx = self.begin().await?;
        let outcome: Result<(Option<Sample>, Vec<Sample>)> = async {
            let focal = self.bounded(self.store.get_sample(&tx, &query.focal)).await?;
            let known = self.bounded(self.store.samples_by_ids(&tx, &query.neighbors)).await?;
            Ok((focal, known))
        }
        .await;
        let (focal, known) = self.finish(tx, outcome).await?;

        let focal = focal.ok_or_else(|| Error::UnknownIdentifier(query.focal.to_string()))?;
        Ok(neighbors::resolve_shared(&focal, &query.neighbors, &known))
    }

    /// [`Engine::shared_features`] as response records.
    pub async fn neighbor_shares(&self, query: &NeighborQuery) -> Result<Vec<NeighborShare>> {
        Ok(neighbors::into_shares(self.shared_features(query).await?))
    }

    /// Taxonomy for a batch of features. Unknown features map to `None`.
    pub async fn resolve_taxonomy(
        &self,
        query: &TaxonomyQuery,
    ) -> Result<BTreeMap<FeatureId, Option<TaxonomyRecord>>> {
        self.bounded(self.taxonomy.resolve(&query.features)).await
    }

    /// Taxonomy for a single feature.
    pub async fn taxonomy_of(&self, feature: &FeatureId) -> Result<Option<TaxonomyRecord>> {
        self.bounded(self.taxonomy.lookup(feature)).await
    }

    /// Taxonomy records with any rank matching `text`.
    pub async fn search_taxonomy(&self, text: &str) -> Result<Vec<TaxonomyRecord>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("empty taxonomy search".into()));
        }
        self.bounded(self.taxonomy.search(text)).await
    }

    /// A single sample by id.
    pub async fn sample(&self, id: &SampleId) -> Result<Sample> {
        let tx = self.begin().await?;
        let outcome = self.bounded(self.store.get_sample(&tx, id)).await;
        self.finish(tx, outcome)
            .await?
            .ok_or_else(|| Error::UnknownIdentifier(id.to_string()))
    }

    /// Newest samples first; undated samples last, then by id.
    pub async fn recent_samples(&self, limit: Option<usize>) -> Result<Vec<Sample>> {
        let cap = self.config.recent_samples_limit;
        let limit = limit.map_or(cap, |l| l.min(cap));

        let tx = self.begin().await?;
        let outcome = self.bounded(self.store.all_samples(&tx)).await;
        let mut samples = self.finish(tx, outcome).await?;

        samples.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        samples.truncate(limit);
        Ok(samples)
    }

    /// Distinct values of a category attribute, for filter pickers.
    pub async fn categories(&self, field: CategoryField) -> Result<Vec<String>> {
        let tx = self.begin().await?;
        let outcome = self.bounded(self.store.categories(&tx, field)).await;
        self.finish(tx, outcome).await
    }

    // ========================================================================
    // Store access
    // ========================================================================

    async fn begin(&self) -> Result<B::Tx> {
        self.bounded(self.store.begin_tx()).await
    }

    /// Close `tx`, then hand back `outcome`. The transaction is closed even
    /// when `outcome` is an error; the operation's own error wins.
    async fn finish<R>(&self, tx: B::Tx, outcome: Result<R>) -> Result<R> {
        let closed = self.bounded(self.store.close_tx(tx)).await;
        let value = outcome?;
        closed?;
        Ok(value)
    }

    /// Bound a store call by the configured timeout.
    async fn bounded<R>(&self, fut: impl Future<Output = Result<R>>) -> Result<R> {
        let limit = self.config.store_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.config.store_timeout_ms, "store call timed out");
                Err(Error::Timeout(limit))
            }
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
