//! Embedding-similarity deduplication of candidate strings.

use crate::client::Embedder;
use crate::error::Result;

/// Similarity above which a candidate counts as a duplicate.
pub const SIMILARITY_THRESHOLD: f32 = 0.85;

/// Structural markers stripped (after lowercasing) before embedding, so
/// similarity reflects content rather than shared formatting.
const STRIP_MARKERS: [&str; 4] = [
    "deuteragonist:",
    "protagonist:",
    "antagonist:",
    "the ending of the narrative is to explore",
];

fn normalize(text: &str) -> String {
    let mut out = text.to_lowercase();
    for marker in STRIP_MARKERS {
        out = out.replace(marker, "");
    }
    out
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Drop every candidate whose maximum similarity to any `existing` string
/// strictly exceeds `threshold`.
///
/// Only candidates are filtered; `existing` is never touched, and the
/// surviving candidates keep their original order. With no existing
/// strings the candidates come back unchanged and no embedding call is
/// made.
pub async fn deduplicate(
    embedder: &dyn Embedder,
    candidates: &[String],
    existing: &[String],
    threshold: f32,
) -> Result<Vec<String>> {
    if existing.is_empty() || candidates.is_empty() {
        return Ok(candidates.to_vec());
    }

    let normalized_candidates: Vec<String> = candidates.iter().map(|t| normalize(t)).collect();
    let normalized_existing: Vec<String> = existing.iter().map(|t| normalize(t)).collect();

    let candidate_vectors = embedder.embed(&normalized_candidates).await?;
    let existing_vectors = embedder.embed(&normalized_existing).await?;

    let mut kept = Vec::new();
    for (candidate, vector) in candidates.iter().zip(&candidate_vectors) {
        let max_similarity = existing_vectors
            .iter()
            .map(|other| cosine_similarity(vector, other))
            .fold(f32::NEG_INFINITY, f32::max);
        if max_similarity <= threshold {
            kept.push(candidate.clone());
        }
    }
    Ok(kept)
}
