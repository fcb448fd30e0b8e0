//! Retrieval engine: top-k ranking of unit vectors by dot product.
//!
//! Corpus and query vectors are expected pre-normalized to unit length
//! (that is the encoder's responsibility), so dot product equals cosine
//! similarity.

use crate::error::{Result, SitegraphError};

/// Raw-score span below which the top-k range counts as degenerate.
pub const SCORE_EPSILON: f32 = 1e-8;

/// Rank the corpus against a query vector.
///
/// Returns at most `k` `(node_id, raw_score)` pairs, descending by score;
/// ties keep corpus input order (stable sort), so repeated identical inputs
/// produce identical output. An empty corpus yields an empty result. A
/// dimension mismatch between the query and any corpus vector is fatal,
/// since mismatched dot products would silently produce meaningless scores.
pub fn rank(
    query: &[f32],
    corpus: &[(String, Vec<f32>)],
    k: usize,
) -> Result<Vec<(String, f32)>> {
    if corpus.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(String, f32)> = Vec::with_capacity(corpus.len());
    for (id, vector) in corpus {
        if vector.len() != query.len() {
            return Err(SitegraphError::Index(format!(
                "Dimension mismatch: query has {} dimensions, corpus entry '{}' has {}",
                query.len(),
                id,
                vector.len()
            )));
        }
        let score: f32 = query.iter().zip(vector.iter()).map(|(a, b)| a * b).sum();
        scored.push((id.clone(), score));
    }

    // Stable sort keeps corpus input order for equal scores
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    Ok(scored)
}

/// Linearly rescale top-k raw scores into `[0, 1]` for presentation/sizing.
///
/// Never used for ranking. When the raw-score range is near-degenerate (all
/// scores equal within [`SCORE_EPSILON`]), every normalized score is `1.0`
/// rather than dividing by a near-zero span.
pub fn normalize_scores(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let min = raw.iter().copied().fold(f32::INFINITY, f32::min);
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max - min < SCORE_EPSILON {
        return vec![1.0; raw.len()];
    }
    raw.iter().map(|s| (s - min) / (max - min)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(entries: &[(&str, &[f32])]) -> Vec<(String, Vec<f32>)> {
        entries
            .iter()
            .map(|(id, v)| (id.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_rank_orders_descending() {
        let corpus = corpus(&[
            ("low", &[0.0, 1.0]),
            ("high", &[1.0, 0.0]),
            ("mid", &[0.7071, 0.7071]),
        ]);
        let ranked = rank(&[1.0, 0.0], &corpus, 3).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_rank_ties_keep_corpus_order() {
        let corpus = corpus(&[
            ("first", &[1.0, 0.0]),
            ("second", &[1.0, 0.0]),
            ("third", &[1.0, 0.0]),
        ]);
        let ranked = rank(&[1.0, 0.0], &corpus, 3).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_k_larger_than_corpus_returns_all_once() {
        let corpus = corpus(&[("a", &[1.0, 0.0]), ("b", &[0.0, 1.0])]);
        let ranked = rank(&[1.0, 0.0], &corpus, 10).unwrap();
        assert_eq!(ranked.len(), 2);
        let mut ids: Vec<&str> = ranked.iter().map(|(id, _)| id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_rank_truncates_to_k() {
        let corpus = corpus(&[
            ("a", &[1.0, 0.0]),
            ("b", &[0.9, 0.1]),
            ("c", &[0.0, 1.0]),
        ]);
        let ranked = rank(&[1.0, 0.0], &corpus, 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, "a");
    }

    #[test]
    fn test_rank_empty_corpus_is_not_an_error() {
        let ranked = rank(&[1.0, 0.0], &[], 5).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_dimension_mismatch_is_fatal() {
        let corpus = corpus(&[("a", &[1.0, 0.0]), ("bad", &[1.0, 0.0, 0.0])]);
        let result = rank(&[1.0, 0.0], &corpus, 5);
        assert!(matches!(result, Err(SitegraphError::Index(_))));
        assert!(result.unwrap_err().to_string().contains("bad"));
    }

    #[test]
    fn test_rank_deterministic_for_identical_inputs() {
        let corpus = corpus(&[
            ("a", &[0.6, 0.8]),
            ("b", &[0.8, 0.6]),
            ("c", &[1.0, 0.0]),
        ]);
        let query = [0.7071, 0.7071];
        assert_eq!(
            rank(&query, &corpus, 3).unwrap(),
            rank(&query, &corpus, 3).unwrap()
        );
    }

    #[test]
    fn test_normalize_rescales_to_unit_interval() {
        let normalized = normalize_scores(&[0.9, 0.5, 0.1]);
        assert!((normalized[0] - 1.0).abs() < 1e-6);
        assert!((normalized[1] - 0.5).abs() < 1e-6);
        assert!((normalized[2] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degenerate_range_is_all_ones() {
        let normalized = normalize_scores(&[0.5, 0.5, 0.5]);
        assert_eq!(normalized, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn test_normalize_single_score() {
        assert_eq!(normalize_scores(&[0.42]), vec![1.0]);
    }
}
