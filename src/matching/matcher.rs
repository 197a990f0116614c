// matcher.rs: Threshold-and-rank passes over the ground truth.
//
// Both passes embed one probe text, then embed every ground-truth item and keep the ones whose
// cosine similarity is strictly above the threshold, ordered by descending rounded score.

use anyhow::{bail, Context};
use indexmap::IndexMap;
use serde::Serialize;

use crate::embeddings::text_prep::synonym_cluster_text;
use crate::matching::similarity::{cosine_similarity, round_score};
use crate::matching::Encoder;

/// One accepted ground-truth item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub item: String,
    /// Similarity rounded to 2 decimals; the ranking key.
    pub score: f64,
    /// Unrounded similarity; always strictly above the threshold it passed.
    #[serde(skip)]
    pub similarity: f64,
}

/// Ground-truth items ordered by non-increasing score, each item at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Matches(Vec<ScoredItem>);

impl Matches {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredItem> {
        self.0.iter()
    }

    pub fn top(&self) -> Option<&ScoredItem> {
        self.0.first()
    }

    /// Rounded score of `item`, if it matched.
    pub fn score_of(&self, item: &str) -> Option<f64> {
        self.0.iter().find(|m| m.item == item).map(|m| m.score)
    }

    pub fn items(&self) -> Vec<&str> {
        self.0.iter().map(|m| m.item.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Matches {
    type Item = &'a ScoredItem;
    type IntoIter = std::slice::Iter<'a, ScoredItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Match the key-item itself against the ground truth.
pub fn key_item_match<E: Encoder + ?Sized>(
    encoder: &E,
    key_item: &str,
    items: &[String],
    threshold: f64,
) -> anyhow::Result<Matches> {
    if key_item.trim().is_empty() {
        bail!("key-item must not be empty");
    }
    let probe = encoder.encode(key_item)?;
    let matches = rank_against(encoder, &probe, items, threshold)?;
    log::debug!(
        "Key-item match for {:?}: {} of {} items above {}",
        key_item,
        matches.len(),
        items.len(),
        threshold
    );
    Ok(matches)
}

/// Match the concatenation of all synonyms of a key-item against the ground truth.
/// Can return more than one match.
pub fn synonym_cluster_match<E: Encoder + ?Sized>(
    encoder: &E,
    synonyms: &[String],
    items: &[String],
    threshold: f64,
) -> anyhow::Result<Matches> {
    let cluster = synonym_cluster_text(synonyms);
    if cluster.trim().is_empty() {
        bail!("synonym cluster must contain at least one phrase");
    }
    let probe = encoder.encode(&cluster)?;
    let matches = rank_against(encoder, &probe, items, threshold)?;
    log::debug!(
        "Synonym-cluster match ({} synonyms): {} of {} items above {}",
        synonyms.len(),
        matches.len(),
        items.len(),
        threshold
    );
    Ok(matches)
}

fn rank_against<E: Encoder + ?Sized>(
    encoder: &E,
    probe: &[f32],
    items: &[String],
    threshold: f64,
) -> anyhow::Result<Matches> {
    // A repeated item keeps its first position.
    let mut accepted: IndexMap<&str, f64> = IndexMap::new();

    for item in items {
        let emb = encoder.encode(item)?;
        let similarity = cosine_similarity(probe, &emb).with_context(|| format!("scoring {item:?}"))?;
        if similarity > threshold {
            accepted.insert(item.as_str(), similarity);
        }
    }

    let mut scored: Vec<ScoredItem> = accepted
        .into_iter()
        .map(|(item, similarity)| ScoredItem {
            item: item.to_string(),
            score: round_score(similarity),
            similarity,
        })
        .collect();

    // Stable: equal rounded scores keep ground-truth order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    Ok(Matches(scored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::testing::TableEncoder;

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_embedding_ranks_first() {
        let enc = TableEncoder::new()
            .with("Kopfschmerzen", &[1.0, 0.0])
            .with("Kopfschmerz", &[1.0, 0.0])
            .with("Rückenschmerzen", &[0.9, 0.4359]);

        let m = key_item_match(&enc, "Kopfschmerz", &items(&["Rückenschmerzen", "Kopfschmerzen"]), 0.5).unwrap();
        assert_eq!(m.items(), vec!["Kopfschmerzen", "Rückenschmerzen"]);
        assert!((m.top().unwrap().similarity - 1.0).abs() < 1e-9);
        assert_eq!(m.score_of("Kopfschmerzen"), Some(1.0));
        assert_eq!(m.score_of("Rückenschmerzen"), Some(0.9));
    }

    #[test]
    fn test_threshold_is_strict() {
        // cos ~ 0.8 against the query (a hair below after f32 rounding)
        let enc = TableEncoder::new()
            .with("q", &[1.0, 0.0])
            .with("edge", &[0.8, 0.6])
            .with("far", &[0.0, 1.0]);

        let m = key_item_match(&enc, "q", &items(&["edge", "far"]), 0.8).unwrap();
        assert!(m.is_empty());

        let m = key_item_match(&enc, "q", &items(&["edge", "far"]), 0.79).unwrap();
        assert_eq!(m.items(), vec!["edge"]);
        for hit in &m {
            assert!(hit.similarity > 0.79);
        }
    }

    #[test]
    fn test_empty_ground_truth() {
        let enc = TableEncoder::new().with("q", &[1.0, 0.0]);
        assert!(key_item_match(&enc, "q", &[], 0.0).unwrap().is_empty());
        assert!(synonym_cluster_match(&enc, &items(&["q"]), &[], 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_sorted_non_increasing() {
        let enc = TableEncoder::new()
            .with("q", &[1.0, 0.0, 0.0])
            .with("a", &[0.2, 1.0, 0.0])
            .with("b", &[1.0, 0.1, 0.0])
            .with("c", &[1.0, 0.5, 0.5])
            .with("d", &[1.0, 0.3, 0.0]);

        let m = key_item_match(&enc, "q", &items(&["a", "b", "c", "d"]), -1.0).unwrap();
        assert_eq!(m.len(), 4);
        let scores: Vec<f64> = m.iter().map(|s| s.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
        assert_eq!(m.top().unwrap().item, "b");
    }

    #[test]
    fn test_duplicate_items_collapse() {
        let enc = TableEncoder::new().with("q", &[1.0, 0.0]).with("x", &[1.0, 0.1]);
        let m = key_item_match(&enc, "q", &items(&["x", "x"]), 0.5).unwrap();
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_synonym_cluster_embeds_joined_text_once() {
        let enc = TableEncoder::new()
            .with("Kopfschmerzen Schädelschmerzen", &[1.0, 0.0])
            .with("Kopfschmerzen", &[0.95, 0.3122])
            .with("Rückenschmerzen", &[0.0, 1.0]);

        let syns = items(&["Kopfschmerzen", "Schädelschmerzen"]);
        let m = synonym_cluster_match(&enc, &syns, &items(&["Kopfschmerzen", "Rückenschmerzen"]), 0.8).unwrap();
        assert_eq!(m.items(), vec!["Kopfschmerzen"]);
        assert_eq!(m.score_of("Kopfschmerzen"), Some(0.95));

        let calls = enc.calls();
        assert_eq!(calls[0], "Kopfschmerzen Schädelschmerzen");
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn test_encoder_error_propagates() {
        let enc = TableEncoder::new().with("q", &[1.0]);
        let err = key_item_match(&enc, "q", &items(&["unknown"]), 0.5).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_blank_query_and_cluster_rejected() {
        let enc = TableEncoder::new().with("x", &[1.0, 0.0]);
        let err = key_item_match(&enc, "  ", &items(&["x"]), -1.0).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let err = synonym_cluster_match(&enc, &[], &items(&["x"]), -1.0).unwrap_err();
        assert!(err.to_string().contains("at least one phrase"));
        assert!(enc.calls().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let enc = TableEncoder::new().with("q", &[1.0, 0.0]).with("x", &[1.0, 0.0, 0.0]);
        let err = key_item_match(&enc, "q", &items(&["x"]), 0.5).unwrap_err();
        assert!(format!("{err:#}").contains("dimensions differ"));
    }

    #[test]
    fn test_serialize_as_ordered_list() {
        let enc = TableEncoder::new().with("q", &[1.0, 0.0]).with("x", &[1.0, 0.0]);
        let m = key_item_match(&enc, "q", &items(&["x"]), 0.5).unwrap();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json, serde_json::json!([{ "item": "x", "score": 1.0 }]));
    }
}
