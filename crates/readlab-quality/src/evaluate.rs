//! Per-summary quality scores

use readlab_domain::Summary;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Scalar metrics for one summary, each in `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Share of summary vocabulary that also occurs in the source
    pub faithfulness: f64,

    /// Share of the six core fields that are filled in
    pub field_coverage: f64,

    /// Unique / total tokens over tags and contributions
    pub diversity: f64,

    /// List items across contributions, methods, results and limitations, saturating at 10
    pub content_richness: f64,
}

impl QualityReport {
    /// Mean of the four metrics
    pub fn overall(&self) -> f64 {
        (self.faithfulness + self.field_coverage + self.diversity + self.content_richness) / 4.0
    }
}

const RICHNESS_SATURATION: f64 = 10.0;

/// Score `summary` against the text it was produced from
pub fn evaluate(summary: &Summary, source_text: &str) -> QualityReport {
    if summary.is_empty() {
        return QualityReport::default();
    }

    QualityReport {
        faithfulness: clamp("faithfulness", faithfulness(summary, source_text)),
        field_coverage: clamp("field_coverage", field_coverage(summary)),
        diversity: clamp("diversity", diversity(summary)),
        content_richness: clamp("content_richness", content_richness(summary)),
    }
}

/// Lower-cased alphanumeric runs
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn faithfulness(summary: &Summary, source_text: &str) -> f64 {
    let mut summary_tokens: HashSet<String> = HashSet::new();
    for field in [&summary.title, &summary.tl_dr] {
        summary_tokens.extend(tokenize(field));
    }
    for list in [
        &summary.contributions,
        &summary.methods,
        &summary.results,
        &summary.limitations,
        &summary.quotes,
    ] {
        for item in list {
            summary_tokens.extend(tokenize(item));
        }
    }
    if summary_tokens.is_empty() {
        return 0.0;
    }

    let source_tokens: HashSet<String> = tokenize(source_text).into_iter().collect();
    let overlap = summary_tokens.iter().filter(|t| source_tokens.contains(*t)).count();
    overlap as f64 / summary_tokens.len() as f64
}

pub(crate) fn filled_core_fields(summary: &Summary) -> usize {
    [
        !summary.title.trim().is_empty(),
        !summary.tl_dr.trim().is_empty(),
        !summary.contributions.is_empty(),
        !summary.methods.is_empty(),
        !summary.results.is_empty(),
        !summary.limitations.is_empty(),
    ]
    .iter()
    .filter(|present| **present)
    .count()
}

pub(crate) const CORE_FIELDS: usize = 6;

fn field_coverage(summary: &Summary) -> f64 {
    filled_core_fields(summary) as f64 / CORE_FIELDS as f64
}

fn diversity(summary: &Summary) -> f64 {
    let tokens: Vec<String> = summary
        .tags
        .iter()
        .chain(&summary.contributions)
        .flat_map(|s| tokenize(s))
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = tokens.iter().collect();
    unique.len() as f64 / tokens.len() as f64
}

fn content_richness(summary: &Summary) -> f64 {
    let items = summary.contributions.len()
        + summary.methods.len()
        + summary.results.len()
        + summary.limitations.len();
    (items as f64 / RICHNESS_SATURATION).min(1.0)
}

fn clamp(metric: &str, value: f64) -> f64 {
    if !value.is_finite() {
        warn!(metric, value, "Non-finite quality metric, reporting 0");
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
