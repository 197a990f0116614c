// orchestrator.rs: Key-item match first, synonym-cluster match as fallback.

use crate::matching::{key_item_match, synonym_cluster_match, Encoder, Matches, Thresholds};
use crate::vocab::SynonymDictionary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    KeyItem,
    SynonymCluster,
    NoMatch,
    UnknownItem,
}

impl MatchStage {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStage::KeyItem => "keyItem",
            MatchStage::SynonymCluster => "synonymCluster",
            MatchStage::NoMatch => "noMatch",
            MatchStage::UnknownItem => "unknownItem",
        }
    }
}

/// Result of [`semantic_item_match`].
///
/// `NoMatch` means the key-item is known but nothing cleared either threshold; `UnknownItem`
/// means the direct match failed and the key-item has no synonym entry to fall back on.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    KeyItem(Matches),
    SynonymCluster(Matches),
    NoMatch,
    UnknownItem,
}

impl MatchOutcome {
    pub fn stage(&self) -> MatchStage {
        match self {
            MatchOutcome::KeyItem(_) => MatchStage::KeyItem,
            MatchOutcome::SynonymCluster(_) => MatchStage::SynonymCluster,
            MatchOutcome::NoMatch => MatchStage::NoMatch,
            MatchOutcome::UnknownItem => MatchStage::UnknownItem,
        }
    }

    pub fn matches(&self) -> Option<&Matches> {
        match self {
            MatchOutcome::KeyItem(m) | MatchOutcome::SynonymCluster(m) => Some(m),
            MatchOutcome::NoMatch | MatchOutcome::UnknownItem => None,
        }
    }

    /// Collapse to a plain mapping, empty when nothing matched for whatever reason.
    pub fn into_matches(self) -> Matches {
        match self {
            MatchOutcome::KeyItem(m) | MatchOutcome::SynonymCluster(m) => m,
            MatchOutcome::NoMatch | MatchOutcome::UnknownItem => Matches::default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let matches = self.matches().cloned().unwrap_or_default();
        serde_json::json!({
            "stage": self.stage().as_str(),
            "matches": matches,
        })
    }
}

/// Match `key_item` against the ground truth, falling back to its synonym cluster.
///
/// The synonym dictionary is only consulted when the direct match comes back empty.
pub fn semantic_item_match<E: Encoder + ?Sized>(
    encoder: &E,
    key_item: &str,
    items: &[String],
    synonyms: &SynonymDictionary,
    thresholds: Thresholds,
) -> anyhow::Result<MatchOutcome> {
    let direct = key_item_match(encoder, key_item, items, thresholds.key_item)?;
    if !direct.is_empty() {
        log::info!("{:?}: {} key-item match(es)", key_item, direct.len());
        return Ok(MatchOutcome::KeyItem(direct));
    }

    let Some(cluster) = synonyms.get(key_item) else {
        log::info!("{:?}: no key-item match and no synonym entry", key_item);
        return Ok(MatchOutcome::UnknownItem);
    };
    if cluster.is_empty() {
        log::info!("{:?}: synonym entry has no phrases", key_item);
        return Ok(MatchOutcome::NoMatch);
    }

    let fallback = synonym_cluster_match(encoder, cluster, items, thresholds.synonym_cluster)?;
    if fallback.is_empty() {
        log::info!("{:?}: no match in either pass", key_item);
        Ok(MatchOutcome::NoMatch)
    } else {
        log::info!("{:?}: {} synonym-cluster match(es)", key_item, fallback.len());
        Ok(MatchOutcome::SynonymCluster(fallback))
    }
}
