//! Batch-level coverage metrics

use crate::evaluate::{filled_core_fields, CORE_FIELDS};
use readlab_domain::Summary;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// How well a batch of summaries covers the expected content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetrics {
    /// Summaries measured
    pub summaries: usize,

    /// Filled core fields over all core fields in the batch
    pub field_completeness: f64,

    /// Normalized entropy of list items (1.0 when no item repeats)
    pub content_diversity: f64,

    /// Unique tags over all tag occurrences
    pub tag_coverage: f64,

    /// Mean contributions per summary
    pub average_contributions: f64,

    /// Mean methods per summary
    pub average_methods: f64,

    /// Mean results per summary
    pub average_results: f64,

    /// Mean limitations per summary
    pub average_limitations: f64,
}

/// Compute coverage metrics over a batch; an empty batch is all zeros
pub fn coverage_metrics(summaries: &[Summary]) -> CoverageMetrics {
    if summaries.is_empty() {
        return CoverageMetrics::default();
    }
    let n = summaries.len() as f64;

    let filled: usize = summaries.iter().map(filled_core_fields).sum();
    let field_completeness = filled as f64 / (CORE_FIELDS * summaries.len()) as f64;

    let all_tags: Vec<&str> = summaries.iter().flat_map(|s| s.tags.iter().map(String::as_str)).collect();
    let tag_coverage = if all_tags.is_empty() {
        0.0
    } else {
        let unique: HashSet<&str> = all_tags.iter().copied().collect();
        unique.len() as f64 / all_tags.len() as f64
    };

    let average = |count: fn(&Summary) -> usize| summaries.iter().map(count).sum::<usize>() as f64 / n;

    CoverageMetrics {
        summaries: summaries.len(),
        field_completeness,
        content_diversity: content_entropy(summaries),
        tag_coverage,
        average_contributions: average(|s| s.contributions.len()),
        average_methods: average(|s| s.methods.len()),
        average_results: average(|s| s.results.len()),
        average_limitations: average(|s| s.limitations.len()),
    }
}

/// Shannon entropy of the list items, divided by its maximum
fn content_entropy(summaries: &[Summary]) -> f64 {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for summary in summaries {
        for list in [
            &summary.contributions,
            &summary.methods,
            &summary.results,
            &summary.limitations,
        ] {
            for item in list {
                let key = item.trim().to_lowercase();
                if key.is_empty() {
                    continue;
                }
                *counts.entry(key).or_insert(0) += 1;
                total += 1;
            }
        }
    }

    if counts.len() < 2 {
        return 0.0;
    }
    let total = total as f64;
    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();
    let max_entropy = (counts.len() as f64).log2();
    (entropy / max_entropy).clamp(0.0, 1.0)
}
