//! Quality command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use readlab_domain::traits::SummaryStore;
use readlab_quality::{coverage_metrics, evaluate, CoverageMetrics, QualityReport};
use readlab_store::FsStore;
use serde::Serialize;
use tracing::warn;

/// Quality scores of one stored summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRow {
    /// Document identity
    pub source_path: String,
    /// Summary title
    pub title: String,
    /// Scores against the stored extract
    #[serde(flatten)]
    pub report: QualityReport,
}

/// Scores for everything in a store.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessment {
    /// Summaries that had an extract to compare against
    pub rows: Vec<QualityRow>,
    /// Coverage over every readable summary
    pub coverage: CoverageMetrics,
    /// Summaries without a stored extract
    pub missing_extracts: usize,
    /// Summaries whose stored extract could not be read
    pub unreadable_extracts: usize,
}

/// Score every stored summary against its stored extract.
pub fn assess_store(store: &FsStore) -> Result<QualityAssessment> {
    let loaded = store.load_summaries()?;
    for entry in &loaded.malformed {
        warn!(path = %entry.path.display(), reason = %entry.reason, "Skipping malformed summary");
    }

    let mut assessment = QualityAssessment {
        coverage: coverage_metrics(&loaded.summaries),
        ..Default::default()
    };
    for summary in &loaded.summaries {
        match store.load_extract(&summary.source_path) {
            Ok(Some(text)) => assessment.rows.push(QualityRow {
                source_path: summary.source_path.clone(),
                title: summary.title.clone(),
                report: evaluate(summary, &text),
            }),
            Ok(None) => {
                warn!(source = %summary.source_path, "No stored extract, skipping quality check");
                assessment.missing_extracts += 1;
            }
            Err(e) => {
                warn!(source = %summary.source_path, error = %e, "Unreadable extract, skipping quality check");
                assessment.unreadable_extracts += 1;
            }
        }
    }
    Ok(assessment)
}

/// Execute the quality command.
pub fn execute_quality(config: &Config, formatter: &Formatter) -> Result<QualityAssessment> {
    let store = FsStore::open(&config.pipeline.store_root)?;
    let assessment = assess_store(&store)?;

    println!("{}", formatter.format_quality(&assessment.rows, &assessment.coverage)?);
    if assessment.missing_extracts > 0 {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} summaries had no stored extract",
                assessment.missing_extracts
            ))
        );
    }
    if assessment.unreadable_extracts > 0 {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} summaries had an unreadable extract",
                assessment.unreadable_extracts
            ))
        );
    }

    Ok(assessment)
}
