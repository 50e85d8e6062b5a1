//! In-memory sample store.
//!
//! This is the reference implementation of `SampleStore`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Semantics
//!
//! - **Copy-on-read**: every scan returns cloned samples, so callers iterate
//!   a private snapshot and never observe a concurrent `insert_sample`.
//! - **Upsert ingestion**: `insert_sample` replaces any sample with the same
//!   id and keeps the category index in step.
//! - **Transactions are markers**: `close_tx()` has nothing to release.
//!
//! Use this store for:
//! - Tests and embedding
//! - Serving a `samples.json` export without a database

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::model::*;
use crate::tx::{Transaction, TxId};
use crate::Result;
use super::{BackendConfig, SampleStore};

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory sample storage.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    samples: RwLock<HashMap<SampleId, Sample>>,
    /// (field, value) → sample ids (poor man's category index)
    category_index: RwLock<HashMap<(CategoryField, String), Vec<SampleId>>>,
    next_tx_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                samples: RwLock::new(HashMap::new()),
                category_index: RwLock::new(HashMap::new()),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    /// Open a store as described by `config`.
    pub fn open(config: &BackendConfig) -> Result<Self> {
        match config {
            BackendConfig::Memory => Ok(Self::new()),
            BackendConfig::JsonSnapshot { path } => Self::load_json(path),
        }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let backend = Self::new();
        for sample in samples {
            backend.insert_sample(sample);
        }
        backend
    }

    /// Load a JSON array of samples from a file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let backend = Self::load_json_reader(BufReader::new(file))?;
        tracing::info!(path = %path.display(), samples = backend.len(), "loaded sample snapshot");
        Ok(backend)
    }

    /// Load a JSON array of samples from any reader.
    pub fn load_json_reader(reader: impl Read) -> Result<Self> {
        let samples: Vec<Sample> = serde_json::from_reader(reader)?;
        Ok(Self::from_samples(samples))
    }

    /// Insert or replace a sample.
    pub fn insert_sample(&self, sample: Sample) {
        let mut samples = self.inner.samples.write();
        let mut idx = self.inner.category_index.write();

        if let Some(previous) = samples.get(&sample.id) {
            for key in category_keys(previous) {
                if let Some(ids) = idx.get_mut(&key) {
                    ids.retain(|id| id != &previous.id);
                }
            }
        }
        for key in category_keys(&sample) {
            idx.entry(key).or_default().push(sample.id.clone());
        }
        samples.insert(sample.id.clone(), sample);
    }

    pub fn len(&self) -> usize {
        self.inner.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.read().is_empty()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn category_keys(sample: &Sample) -> Vec<(CategoryField, String)> {
    [CategoryField::Biome, CategoryField::EnvFeature]
        .into_iter()
        .filter_map(|field| sample.category(field).map(|v| (field, v.to_owned())))
        .collect()
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction. A marker; there is nothing to lock.
pub struct MemoryTx {
    id: TxId,
}

impl Transaction for MemoryTx {
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// SampleStore impl
// ============================================================================

#[async_trait]
impl SampleStore for MemoryBackend {
    type Tx = MemoryTx;

    async fn shutdown(&self) -> Result<()> { Ok(()) }

    async fn begin_tx(&self) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id })
    }

    async fn close_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    async fn get_sample(&self, _tx: &MemoryTx, id: &SampleId) -> Result<Option<Sample>> {
        Ok(self.inner.samples.read().get(id).cloned())
    }

    async fn samples_by_ids(&self, _tx: &MemoryTx, ids: &[SampleId]) -> Result<Vec<Sample>> {
        let samples = self.inner.samples.read();
        Ok(ids.iter().filter_map(|id| samples.get(id).cloned()).collect())
    }

    async fn all_samples(&self, _tx: &MemoryTx) -> Result<Vec<Sample>> {
        Ok(self.inner.samples.read().values().cloned().collect())
    }

    async fn sample_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.samples.read().len() as u64)
    }

    async fn samples_by_category(
        &self,
        _tx: &MemoryTx,
        filter: &CategoryFilter,
    ) -> Result<Vec<Sample>> {
        // same lock order as insert_sample
        let samples = self.inner.samples.read();
        let idx = self.inner.category_index.read();

        let key = (filter.field, filter.value.clone());
        let ids = idx.get(&key).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| samples.get(id).cloned()).collect())
    }

    async fn categories(&self, _tx: &MemoryTx, field: CategoryField) -> Result<Vec<String>> {
        let idx = self.inner.category_index.read();
        let mut values: Vec<String> = idx
            .iter()
            .filter(|((f, _), ids)| *f == field && !ids.is_empty())
            .map(|((_, v), _)| v.clone())
            .collect();
        values.sort();
        Ok(values)
    }
}

// ============================================================================
// Tests
// ============================================================================
