//! # Sample Store Trait
//!
//! This is THE contract between the engine and whatever holds the samples.
//! The engine never owns a connection: a store is injected into
//! [`Engine`](crate::Engine) and every operation borrows it through a
//! short-lived read transaction.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory, also loads JSON sample exports |

pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::model::*;
use crate::tx::Transaction;
use crate::Result;

pub use memory::MemoryBackend;

// ============================================================================
// Backend Configuration
// ============================================================================

/// Configuration for opening a sample store.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Empty in-memory store.
    Memory,

    /// In-memory store seeded from a JSON array of samples
    /// (the dashboard's `samples.json` export format).
    JsonSnapshot { path: PathBuf },
}

// ============================================================================
// SampleStore Trait
// ============================================================================

/// The read-only sample contract.
///
/// Only `get_sample`, `all_samples` and `sample_count` are required;
/// everything else has a scan-based default that stores may override
/// with an index.
#[async_trait]
pub trait SampleStore: Send + Sync + 'static {
    /// The transaction type for this store.
    type Tx: Transaction;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Shut down the store, releasing any held resources.
    async fn shutdown(&self) -> Result<()>;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Open a read transaction.
    async fn begin_tx(&self) -> Result<Self::Tx>;

    /// Close a read transaction.
    async fn close_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Get a sample by id. Returns None if not found.
    async fn get_sample(&self, tx: &Self::Tx, id: &SampleId) -> Result<Option<Sample>>;

    /// Fetch several samples. Unknown ids are skipped; the result follows
    /// the order of `ids`.
    ///
    /// Default: one `get_sample` per id.
    async fn samples_by_ids(&self, tx: &Self::Tx, ids: &[SampleId]) -> Result<Vec<Sample>> {
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(sample) = self.get_sample(tx, id).await? {
                result.push(sample);
            }
        }
        Ok(result)
    }

    // ========================================================================
    // Scan
    // ========================================================================

    /// Return every sample.
    async fn all_samples(&self, tx: &Self::Tx) -> Result<Vec<Sample>>;

    /// Total number of samples.
    async fn sample_count(&self, tx: &Self::Tx) -> Result<u64>;

    /// Samples whose category attribute matches the filter.
    ///
    /// Default: full scan.
    async fn samples_by_category(
        &self,
        tx: &Self::Tx,
        filter: &CategoryFilter,
    ) -> Result<Vec<Sample>> {
        let mut samples = self.all_samples(tx).await?;
        samples.retain(|s| filter.matches(s));
        Ok(samples)
    }

    /// Samples that carry a usable coordinate.
    ///
    /// Default: full scan.
    async fn located_samples(&self, tx: &Self::Tx) -> Result<Vec<Sample>> {
        let mut samples = self.all_samples(tx).await?;
        samples.retain(|s| s.location().is_some());
        Ok(samples)
    }

    /// Sorted distinct non-blank values of a category attribute.
    ///
    /// Default: full scan.
    async fn categories(&self, tx: &Self::Tx, field: CategoryField) -> Result<Vec<String>> {
        let samples = self.all_samples(tx).await?;
        let mut values: Vec<String> = samples
            .iter()
            .filter_map(|s| s.category(field))
            .map(str::to_owned)
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }
}
