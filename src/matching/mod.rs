// matching/: Semantic item matching against a ground-truth vocabulary.
//
// Step 1: match the key-item directly; accept if cosine similarity is above t1 (0.85).
// Step 2: otherwise match the key-item's synonym cluster; accept above t2 (0.8).

use anyhow::bail;
use serde::Serialize;

use crate::config;

pub mod matcher;
pub mod orchestrator;
pub mod similarity;

#[cfg(test)]
pub(crate) mod testing;

pub use matcher::{key_item_match, synonym_cluster_match, Matches};
pub use orchestrator::semantic_item_match;

/// Turns a string into an embedding vector. Implemented by the candle engine; tests use a table.
pub trait Encoder {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub key_item: f64,
    pub synonym_cluster: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            key_item: config::matching::DEFAULT_KEY_ITEM_THRESHOLD,
            synonym_cluster: config::matching::DEFAULT_SYNONYM_CLUSTER_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn new(key_item: f64, synonym_cluster: f64) -> anyhow::Result<Self> {
        validate_threshold("key-item", key_item)?;
        validate_threshold("synonym-cluster", synonym_cluster)?;
        Ok(Self {
            key_item,
            synonym_cluster,
        })
    }
}

pub fn validate_threshold(name: &str, t: f64) -> anyhow::Result<f64> {
    let range = config::matching::MIN_THRESHOLD..=config::matching::MAX_THRESHOLD;
    if !range.contains(&t) {
        bail!("{name} threshold must be within [{}, {}], got {t}", range.start(), range.end());
    }
    Ok(t)
}
