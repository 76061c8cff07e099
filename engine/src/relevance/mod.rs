//! Relevance filtering of retrieval candidates
//!
//! Decides which retrieved documents are worth injecting into the prompt.
//! Scores follow the cosine-distance convention (lower is more similar),
//! and the retrieval service returns candidates best first, so keeping
//! everything at or under the threshold keeps a prefix of the input.
//!
//! When nothing passes the threshold but candidates exist, the filter
//! falls back to the first `min_docs` candidates: weak grounding beats no
//! grounding. Pure and deterministic; the no-candidates case returns
//! empty and the caller substitutes its no-knowledge marker.

use sdk::types::ScoredDocument;
use tracing::debug;

/// Threshold-plus-floor document filter.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceFilter {
    /// Cosine-distance cutoff; documents with `score <= threshold` pass
    pub threshold: f64,

    /// Minimum documents returned whenever at least one candidate exists
    pub min_docs: usize,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self {
            threshold: 1.5,
            min_docs: 1,
        }
    }
}

impl RelevanceFilter {
    pub fn new(threshold: f64, min_docs: usize) -> Self {
        Self {
            threshold,
            min_docs,
        }
    }

    /// Filter candidates (already sorted best first) down to the ones
    /// worth putting in front of the model.
    pub fn filter(&self, candidates: &[ScoredDocument]) -> Vec<ScoredDocument> {
        let kept: Vec<ScoredDocument> = candidates
            .iter()
            .filter(|d| d.score <= self.threshold)
            .cloned()
            .collect();

        if kept.len() >= self.min_docs || candidates.is_empty() {
            debug!(
                "Relevance filter kept {}/{} candidates at threshold {}",
                kept.len(),
                candidates.len(),
                self.threshold
            );
            return kept;
        }

        // Floor: nothing (or too little) passed, but candidates exist.
        let floor: Vec<ScoredDocument> =
            candidates.iter().take(self.min_docs).cloned().collect();
        debug!(
            "Relevance floor engaged: {}/{} candidates taken regardless of score",
            floor.len(),
            candidates.len()
        );
        floor
    }
}
