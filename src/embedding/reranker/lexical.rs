//! Deterministic lexical-overlap score used when no reranker weights are loaded.

use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
    "about", "then", "there", "here", "when", "where", "why", "how", "all", "each", "some",
    "no", "not", "only", "so", "than", "too", "very", "just", "and", "but", "if", "or",
    "what", "which", "who", "this", "that", "these", "those", "am", "it", "its", "i", "me",
    "my", "we", "our", "you", "your",
];

fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Scores `candidate` against `query` in `[0, 1]`.
///
/// Blends query-term recall (0.6) with Jaccard overlap (0.4), then squashes the
/// blend through a logistic curve centred at 0.5.
pub fn lexical_overlap_score(query: &str, candidate: &str) -> f32 {
    let query_words = content_words(query);
    let candidate_words = content_words(candidate);

    if query_words.is_empty() {
        let shorter = query.len().min(candidate.len()) as f32;
        let longer = query.len().max(candidate.len()).max(1) as f32;
        return (shorter / longer) * 0.3;
    }

    let matches = query_words.intersection(&candidate_words).count();
    let recall = matches as f32 / query_words.len() as f32;

    let union = query_words.union(&candidate_words).count();
    let jaccard = if union > 0 {
        matches as f32 / union as f32
    } else {
        0.0
    };

    let blended = 0.6 * recall + 0.4 * jaccard;

    (1.0 / (1.0 + (-8.0 * (blended - 0.5)).exp())).clamp(0.0, 1.0)
}
