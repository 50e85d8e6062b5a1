//! Features (ASVs) and their taxonomy records.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque feature identifier (an amplicon sequence variant).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `n` characters, for display of long sequences.
    pub fn short(&self, n: usize) -> &str {
        match self.0.char_indices().nth(n) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FeatureId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FeatureId {
    fn from(v: &str) -> Self { Self(v.to_owned()) }
}

impl From<String> for FeatureId {
    fn from(v: String) -> Self { Self(v) }
}

impl From<&FeatureId> for FeatureId {
    fn from(v: &FeatureId) -> Self { v.clone() }
}

/// Taxonomic classification of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyRecord {
    #[serde(alias = "asv_seq")]
    pub asv_seq: FeatureId,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub phylum: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl TaxonomyRecord {
    pub fn new(asv_seq: impl Into<FeatureId>) -> Self {
        Self {
            asv_seq: asv_seq.into(),
            domain: None,
            phylum: None,
            class: None,
            order: None,
            family: None,
            genus: None,
            species: None,
            confidence: None,
        }
    }

    pub fn with_rank(mut self, rank: &str, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match rank {
            "domain" => self.domain = value,
            "phylum" => self.phylum = value,
            "class" => self.class = value,
            "order" => self.order = value,
            "family" => self.family = value,
            "genus" => self.genus = value,
            "species" => self.species = value,
            _ => {}
        }
        self
    }

    /// Ranks from domain down to species.
    pub fn ranks(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("domain", self.domain.as_deref()),
            ("phylum", self.phylum.as_deref()),
            ("class", self.class.as_deref()),
            ("order", self.order.as_deref()),
            ("family", self.family.as_deref()),
            ("genus", self.genus.as_deref()),
            ("species", self.species.as_deref()),
        ]
    }

    /// `"Bacteria; Proteobacteria; ..."`, stopping at the first missing rank.
    pub fn lineage(&self) -> String {
        self.ranks()
            .iter()
            .map_while(|(_, v)| *v)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Case-insensitive substring match against any rank.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.ranks()
            .iter()
            .filter_map(|(_, v)| *v)
            .any(|v| v.to_lowercase().contains(&needle))
    }
}
