// similarity.rs: Cosine similarity and score rounding.

use anyhow::bail;

use crate::config;

/// Cosine similarity of two embeddings in [-1, 1].
///
/// Embeddings of different dimensions are an error. A zero-norm vector has no direction and
/// scores 0.0 against everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> anyhow::Result<f64> {
    if a.len() != b.len() {
        bail!("embedding dimensions differ: {} vs {}", a.len(), b.len());
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Round a similarity to the reported precision (2 decimals).
pub fn round_score(similarity: f64) -> f64 {
    let factor = 10f64.powi(config::matching::SCORE_DECIMALS);
    (similarity * factor).round() / factor
}
