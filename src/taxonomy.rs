//! Taxonomy enrichment.
//!
//! The engine consumes taxonomy, it does not own it. `TaxonomyStore` is the
//! seam; lookups never touch sample data and unknown features resolve to
//! `None` instead of failing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::model::{FeatureId, TaxonomyRecord};
use crate::Result;

#[async_trait]
pub trait TaxonomyStore: Send + Sync + 'static {
    /// Record for a single feature, if one is known.
    async fn lookup(&self, feature: &FeatureId) -> Result<Option<TaxonomyRecord>>;

    /// Resolve a batch. Every requested id appears in the result.
    ///
    /// Default: one `lookup` per distinct id.
    async fn resolve(
        &self,
        features: &[FeatureId],
    ) -> Result<BTreeMap<FeatureId, Option<TaxonomyRecord>>> {
        let mut out = BTreeMap::new();
        for feature in features {
            if out.contains_key(feature) {
                continue;
            }
            let record = self.lookup(feature).await?;
            out.insert(feature.clone(), record);
        }
        Ok(out)
    }

    /// Records with any rank containing `text`, case-insensitively.
    async fn search(&self, text: &str) -> Result<Vec<TaxonomyRecord>>;
}

// ============================================================================
// NoTaxonomy
// ============================================================================

/// Resolves every feature to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTaxonomy;

#[async_trait]
impl TaxonomyStore for NoTaxonomy {
    async fn lookup(&self, _feature: &FeatureId) -> Result<Option<TaxonomyRecord>> {
        Ok(None)
    }

    async fn search(&self, _text: &str) -> Result<Vec<TaxonomyRecord>> {
        Ok(Vec::new())
    }
}

// ============================================================================
// MemoryTaxonomy
// ============================================================================

/// In-memory taxonomy table keyed by feature id.
#[derive(Clone, Default)]
pub struct MemoryTaxonomy {
    records: Arc<RwLock<HashMap<FeatureId, TaxonomyRecord>>>,
}

impl MemoryTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TaxonomyRecord>) -> Self {
        let table = Self::new();
        for record in records {
            table.insert(record);
        }
        table
    }

    /// Load a JSON array of taxonomy records.
    pub fn load_json_reader(reader: impl std::io::Read) -> Result<Self> {
        let records: Vec<TaxonomyRecord> = serde_json::from_reader(reader)?;
        Ok(Self::from_records(records))
    }

    pub fn insert(&self, record: TaxonomyRecord) {
        self.records.write().insert(record.asv_seq.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl TaxonomyStore for MemoryTaxonomy {
    async fn lookup(&self, feature: &FeatureId) -> Result<Option<TaxonomyRecord>> {
        Ok(self.records.read().get(feature).cloned())
    }

    async fn resolve(
        &self,
        features: &[FeatureId],
    ) -> Result<BTreeMap<FeatureId, Option<TaxonomyRecord>>> {
        let records = self.records.read();
        Ok(features
            .iter()
            .map(|f| (f.clone(), records.get(f).cloned()))
            .collect())
    }

    async fn search(&self, text: &str) -> Result<Vec<TaxonomyRecord>> {
        let mut hits: Vec<TaxonomyRecord> = self
            .records
            .read()
            .values()
            .filter(|r| r.matches_text(text))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.asv_seq.cmp(&b.asv_seq));
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MemoryTaxonomy {
        MemoryTaxonomy::from_records([
            TaxonomyRecord::new("ACGT").with_rank("domain", "Bacteria").with_rank("genus", "Bacillus"),
            TaxonomyRecord::new("TTGA").with_rank("domain", "Archaea"),
        ])
    }

    #[tokio::test]
    async fn test_resolve_marks_unknown_as_none() {
        let t = table();
        let out = t.resolve(&["ACGT".into(), "NOPE".into()]).await.unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[&FeatureId::from("ACGT")].is_some());
        assert!(out[&FeatureId::from("NOPE")].is_none());
    }

    #[tokio::test]
    async fn test_default_resolve_on_no_taxonomy() {
        let out = NoTaxonomy.resolve(&["ACGT".into(), "ACGT".into()]).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.values().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_search_any_rank() {
        let t = table();
        let hits = t.search("bacteria").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].asv_seq.as_str(), "ACGT");
        assert!(t.search("fungi").await.unwrap().is_empty());
    }

    #[test]
    fn test_load_json_reader() {
        let json = r#"[{"asvSeq": "ACGT", "phylum": "Firmicutes", "confidence": 0.98}]"#;
        let t = MemoryTaxonomy::load_json_reader(json.as_bytes()).unwrap();
        assert_eq!(t.len(), 1);
    }
}
