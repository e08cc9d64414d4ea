//! Identical-bill resolution over results from the similarity backend.
//!
//! The backend itself is opaque here: it hands back a ranked list of
//! [`SimilarityMatch`] rows, each with a score and a comma-joined reason list.

use crate::congress::{sort_bills_for_congress, BillKey};
use crate::types::SimilarityMatch;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Reasons that mark a match as the same bill
pub const IDENTICAL_REASONS: &[&str] = &["identical", "nearly identical", "title match (main)"];

/// Relative score difference under which two bills count as identical
pub const SIMILARITY_THRESHOLD: f64 = 0.1;

/// Split a comma-joined reason string into trimmed, lowercased reasons
pub fn clean_reasons(reason: &str) -> Vec<String> {
    reason
        .split(',')
        .map(|r| r.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect()
}

pub fn has_identical_reason(m: &SimilarityMatch) -> bool {
    clean_reasons(&m.reason)
        .iter()
        .any(|r| IDENTICAL_REASONS.contains(&r.as_str()))
}

/// The current bill's own score in the result list, if it is listed
pub fn current_bill_score(current: &BillKey, matches: &[SimilarityMatch]) -> Option<f64> {
    matches
        .iter()
        .find(|m| m.key() == *current)
        .map(|m| m.score)
}

/// Score proximity test. Only applies when the current score is positive:
/// a missing score and a zero score both disable it.
// TODO: a real zero score is indistinguishable from "not listed" here; split
// the two once the backend reports whether the current bill was scored.
pub fn within_score_threshold(score: f64, current_score: Option<f64>) -> bool {
    match current_score {
        Some(current) if current > 0.0 => (score - current).abs() / current < SIMILARITY_THRESHOLD,
        _ => false,
    }
}

/// Keys of the matches that are identical to `current`, in congress order.
///
/// A match is identical when one of its reasons is in [`IDENTICAL_REASONS`]
/// or its score is within [`SIMILARITY_THRESHOLD`] of `current_score`.
/// Matches without a key are dropped; repeated keys are kept once.
pub fn resolve_identical(
    current: &BillKey,
    matches: &[SimilarityMatch],
    current_score: Option<f64>,
) -> Vec<BillKey> {
    let mut seen = HashSet::new();
    let mut identical: Vec<BillKey> = matches
        .iter()
        .filter(|m| has_identical_reason(m) || within_score_threshold(m.score, current_score))
        .map(SimilarityMatch::key)
        .filter(|key| !key.is_empty())
        .filter(|key| seen.insert(key.clone()))
        .collect();

    sort_bills_for_congress(&mut identical);
    debug!("{} identical bills for {}", identical.len(), current);
    identical
}

/// Display summary of a similarity query
#[derive(Debug, Clone, Serialize)]
pub struct SimilarBillsSummary {
    pub best_match: Option<SimilarityMatch>,
    pub similar_bill_numbers: Vec<BillKey>,
    pub similar_sections: Vec<SimilarityMatch>,
    pub no_results: bool,
}

/// Sort sections by score (descending) and pick the best match.
/// An empty result is a valid state and sets `no_results`.
pub fn summarize_similar(mut sections: Vec<SimilarityMatch>) -> SimilarBillsSummary {
    sections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen = HashSet::new();
    let similar_bill_numbers = sections
        .iter()
        .map(SimilarityMatch::key)
        .filter(|key| !key.is_empty() && seen.insert(key.clone()))
        .collect();

    SimilarBillsSummary {
        best_match: sections.first().cloned(),
        similar_bill_numbers,
        no_results: sections.is_empty(),
        similar_sections: sections,
    }
}
