//! Output formatting for the CLI.

use crate::commands::quality::QualityRow;
use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use readlab_aggregator::AggregationReport;
use readlab_domain::ErrorRecord;
use readlab_pipeline::{BatchResult, DocumentOutcome};
use readlab_quality::CoverageMetrics;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const MESSAGE_WIDTH: usize = 80;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self { format, color_enabled }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the end-of-run report of a batch.
    pub fn format_batch(&self, result: &BatchResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => Ok(self.format_batch_table(result)),
            OutputFormat::Quiet => Ok(format_batch_quiet(result)),
        }
    }

    fn format_batch_table(&self, result: &BatchResult) -> String {
        let mut out = Vec::new();

        if !result.outcomes.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Source", "Status", "Detail"]);
            for outcome in &result.outcomes {
                let (status, detail) = match outcome {
                    DocumentOutcome::Summarized { title, chunks, quality, .. } => (
                        self.colorize("summarized", "green"),
                        format!("{} ({} chunks, quality {:.2})", title, chunks, quality.overall()),
                    ),
                    DocumentOutcome::Ingested { char_len, chunks, .. } => (
                        self.colorize("ingested", "green"),
                        format!("{} chars, {} chunks", char_len, chunks),
                    ),
                    DocumentOutcome::Failed(record) => (
                        self.colorize("failed", "red"),
                        format!("{} at {}", record.kind, record.stage),
                    ),
                    DocumentOutcome::Cancelled { .. } => (self.colorize("cancelled", "yellow"), String::new()),
                };
                builder.push_record([outcome.source_path().to_string(), status, detail]);
            }
            out.push(styled(builder));
        }

        out.push(format!(
            "Processed: {}  Succeeded: {}  Failed: {}  Cancelled: {}  ({} ms)",
            result.processed(),
            result.succeeded(),
            result.failed(),
            result.cancelled(),
            result.elapsed_ms
        ));
        if let Some(mean) = result.mean_quality() {
            out.push(format!("Mean quality: {:.2}", mean));
        }

        let failures: Vec<&ErrorRecord> = result.failures().collect();
        if !failures.is_empty() {
            out.push(self.error(&format!("{} document(s) failed", failures.len())));
            out.push(self.format_failures_table(&failures));
        }

        out.join("\n")
    }

    /// Format error records as a table.
    pub fn format_failures_table(&self, failures: &[&ErrorRecord]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Source", "Stage", "Kind", "Attempts", "Message"]);
        for record in failures {
            builder.push_record([
                record.source_path.clone(),
                record.stage.to_string(),
                record.kind.clone(),
                record.attempts.to_string(),
                truncate(&record.message, MESSAGE_WIDTH),
            ]);
        }
        styled(builder)
    }

    /// Format the result of writing a digest.
    pub fn format_aggregation(&self, report: &AggregationReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report.digest_path.display().to_string()),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!(
                    "Digest written to {} ({} papers in {} categories)",
                    report.digest_path.display(),
                    report.items,
                    report.groups
                ))];
                lines.push(format!(
                    "Contributions: {}  Methods: {}  Results: {}  Limitations: {}",
                    report.total_contributions, report.total_methods, report.total_results, report.total_limitations
                ));
                if report.skipped > 0 {
                    lines.push(self.warning(&format!("Skipped {} unreadable stored entries", report.skipped)));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format per-summary quality scores and batch coverage.
    pub fn format_quality(&self, rows: &[QualityRow], coverage: &CoverageMetrics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "summaries": rows,
                "coverage": coverage,
            }))?),
            OutputFormat::Quiet => Ok(rows
                .iter()
                .map(|r| format!("{:.3}\t{}", r.report.overall(), r.source_path))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.format_quality_table(rows, coverage)),
        }
    }

    fn format_quality_table(&self, rows: &[QualityRow], coverage: &CoverageMetrics) -> String {
        if rows.is_empty() {
            return self.colorize("No summaries found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Source", "Title", "Faithful", "Coverage", "Diversity", "Richness", "Overall"]);
        for row in rows {
            builder.push_record([
                row.source_path.clone(),
                truncate(&row.title, 40),
                format!("{:.2}", row.report.faithfulness),
                format!("{:.2}", row.report.field_coverage),
                format!("{:.2}", row.report.diversity),
                format!("{:.2}", row.report.content_richness),
                format!("{:.2}", row.report.overall()),
            ]);
        }

        let mut metrics = Builder::default();
        metrics.push_record(["Metric", "Value"]);
        for (name, value) in [
            ("Summaries", coverage.summaries as f64),
            ("Field completeness", coverage.field_completeness),
            ("Content diversity", coverage.content_diversity),
            ("Tag coverage", coverage.tag_coverage),
            ("Avg contributions", coverage.average_contributions),
            ("Avg methods", coverage.average_methods),
            ("Avg results", coverage.average_results),
            ("Avg limitations", coverage.average_limitations),
        ] {
            metrics.push_record([name.to_string(), format!("{:.2}", value)]);
        }

        format!("{}\n{}", styled(builder), styled(metrics))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn format_batch_quiet(result: &BatchResult) -> String {
    let mut lines = vec![format!(
        "{} {} {} {}",
        result.processed(),
        result.succeeded(),
        result.failed(),
        result.cancelled()
    )];
    lines.extend(result.failures().map(|r| r.source_path.clone()));
    lines.join("\n")
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn truncate(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= width && line.len() == text.len() {
        return line.to_string();
    }
    let mut out: String = line.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use readlab_domain::PipelineStage;
    use readlab_quality::QualityReport;
    use std::path::PathBuf;

    fn batch() -> BatchResult {
        let mut result = BatchResult::new();
        result.record(DocumentOutcome::Summarized {
            source_path: "papers/a.pdf".to_string(),
            title: "Attention".to_string(),
            chunks: 3,
            quality: QualityReport {
                faithfulness: 0.5,
                field_coverage: 1.0,
                diversity: 0.5,
                content_richness: 1.0,
            },
        });
        result.record(DocumentOutcome::Failed(ErrorRecord {
            source_path: "papers/b.pdf".to_string(),
            stage: PipelineStage::Summarize,
            kind: "timeout".to_string(),
            message: "generation timed out".to_string(),
            attempts: 3,
            recorded_at: 1,
        }));
        result
    }

    #[test]
    fn test_batch_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_batch(&batch()).unwrap();
        assert!(output.contains("Processed: 2  Succeeded: 1  Failed: 1  Cancelled: 0"));
        assert!(output.contains("✗ 1 document(s) failed"));
        assert!(output.contains("generation timed out"));
        assert!(output.contains("Attention (3 chunks, quality 0.75)"));
    }

    #[test]
    fn test_batch_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_batch(&batch()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["outcomes"][1]["status"], "failed");
    }

    #[test]
    fn test_batch_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_batch(&batch()).unwrap();
        assert_eq!(output, "2 1 1 0\npapers/b.pdf");
    }

    #[test]
    fn test_aggregation_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = AggregationReport {
            digest_path: PathBuf::from("out/digest.md"),
            items: 4,
            groups: 2,
            skipped: 1,
            ..Default::default()
        };
        let output = formatter.format_aggregation(&report).unwrap();
        assert!(output.contains("✓ Digest written to out/digest.md (4 papers in 2 categories)"));
        assert!(output.contains("⚠ Skipped 1"));
    }

    #[test]
    fn test_empty_quality() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_quality(&[], &CoverageMetrics::default()).unwrap();
        assert!(output.contains("No summaries found"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("first\nsecond", 80), "first...");
    }
}
