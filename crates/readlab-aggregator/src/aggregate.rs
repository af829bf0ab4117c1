//! Store-level aggregation run

use crate::error::AggregatorError;
use crate::merge::{merge_summaries_by, DigestItem};
use crate::render::{render_digest_with, DigestOptions};
use readlab_domain::traits::SummaryStore;
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What an aggregation run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationReport {
    /// Digest file that was written
    pub digest_path: PathBuf,

    /// Summaries rendered after deduplication
    pub items: usize,

    /// Number of groups (sections)
    pub groups: usize,

    /// Stored entries skipped because they could not be read
    pub skipped: usize,

    /// Size of the digest in bytes
    pub bytes: usize,

    /// Contributions across rendered summaries
    pub total_contributions: usize,

    /// Methods across rendered summaries
    pub total_methods: usize,

    /// Results across rendered summaries
    pub total_results: usize,

    /// Limitations across rendered summaries
    pub total_limitations: usize,
}

impl AggregationReport {
    fn from_items(items: &[DigestItem], digest_path: &Path, skipped: usize, bytes: usize) -> Self {
        let mut groups: Vec<&str> = items.iter().map(|i| i.group.as_str()).collect();
        groups.dedup();

        let mut report = Self {
            digest_path: digest_path.to_path_buf(),
            items: items.len(),
            groups: groups.len(),
            skipped,
            bytes,
            ..Default::default()
        };
        for item in items {
            report.total_contributions += item.summary.contributions.len();
            report.total_methods += item.summary.methods.len();
            report.total_results += item.summary.results.len();
            report.total_limitations += item.summary.limitations.len();
        }
        report
    }
}

/// Load every stored summary, render the digest and write it to `digest_path`
///
/// Malformed entries are logged and skipped. The digest replaces any
/// previous file atomically.
pub fn aggregate_store<S>(
    store: &S,
    digest_path: &Path,
    options: &DigestOptions,
) -> Result<AggregationReport, AggregatorError>
where
    S: SummaryStore,
    S::Error: Display,
{
    let loaded = store
        .load_summaries()
        .map_err(|e| AggregatorError::Store(e.to_string()))?;

    for entry in &loaded.malformed {
        warn!(path = %entry.path.display(), reason = %entry.reason, "Skipping malformed summary");
    }
    let skipped = loaded.malformed.len();

    let items = merge_summaries_by(loaded.summaries, options.group_by);
    let digest = render_digest_with(&items, options);
    readlab_store::write_atomic(digest_path, digest.as_bytes())?;

    let report = AggregationReport::from_items(&items, digest_path, skipped, digest.len());
    info!(
        digest = %digest_path.display(),
        items = report.items,
        groups = report.groups,
        skipped = report.skipped,
        bytes = report.bytes,
        "Digest written"
    );
    Ok(report)
}
