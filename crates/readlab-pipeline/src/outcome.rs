//! Per-document outcomes and the batch accumulator

use readlab_domain::ErrorRecord;
use readlab_quality::QualityReport;
use serde::Serialize;
use uuid::Uuid;

/// What happened to one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Summary written to the store
    Summarized {
        /// Document identity
        source_path: String,
        /// Title of the stored summary
        title: String,
        /// Chunks the text was split into
        chunks: usize,
        /// Heuristic quality of the summary
        quality: QualityReport,
    },

    /// Text and metadata written (ingest-only runs)
    Ingested {
        /// Document identity
        source_path: String,
        /// Characters of cleaned text
        char_len: usize,
        /// Chunks the text was split into
        chunks: usize,
    },

    /// The document failed; the record was also written to the store
    Failed(ErrorRecord),

    /// Not started, or aborted, because the batch was cancelled
    Cancelled {
        /// Document identity
        source_path: String,
    },
}

impl DocumentOutcome {
    /// Identity of the document this outcome is about
    pub fn source_path(&self) -> &str {
        match self {
            DocumentOutcome::Summarized { source_path, .. }
            | DocumentOutcome::Ingested { source_path, .. }
            | DocumentOutcome::Cancelled { source_path } => source_path,
            DocumentOutcome::Failed(record) => &record.source_path,
        }
    }

    /// Whether the document made it through
    pub fn is_success(&self) -> bool {
        matches!(self, DocumentOutcome::Summarized { .. } | DocumentOutcome::Ingested { .. })
    }
}

/// Outcomes of one batch run, in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Identifier of this run, for correlating logs
    pub run_id: Uuid,

    /// One outcome per input path
    pub outcomes: Vec<DocumentOutcome>,

    /// Wall-clock duration of the run (milliseconds)
    pub elapsed_ms: u64,
}

impl BatchResult {
    /// Create an empty result for a new run
    pub fn new() -> Self {
        Self {
            run_id: Uuid::now_v7(),
            outcomes: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Add one document's outcome
    pub fn record(&mut self, outcome: DocumentOutcome) {
        self.outcomes.push(outcome);
    }

    /// Documents that were started and finished (successfully or not)
    pub fn processed(&self) -> usize {
        self.succeeded() + self.failed()
    }

    /// Documents that succeeded
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Documents that failed
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Documents skipped or aborted by cancellation
    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Cancelled { .. }))
            .count()
    }

    /// Error records of the failed documents
    pub fn failures(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            DocumentOutcome::Failed(record) => Some(record),
            _ => None,
        })
    }

    /// Mean quality over summarized documents, if any
    pub fn mean_quality(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .outcomes
            .iter()
            .filter_map(|o| match o {
                DocumentOutcome::Summarized { quality, .. } => Some(quality.overall()),
                _ => None,
            })
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Generate a summary report of the run
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Batch Summary".to_string(),
            "=============".to_string(),
            format!("Run: {}", self.run_id),
            format!("Processed: {}", self.processed()),
            format!("Succeeded: {}", self.succeeded()),
            format!("Failed: {}", self.failed()),
            format!("Cancelled: {}", self.cancelled()),
            format!("Elapsed: {}ms", self.elapsed_ms),
        ];

        if self.failed() > 0 {
            lines.push(String::new());
            lines.push("Failures:".to_string());
            for record in self.failures() {
                lines.push(format!(
                    "  {} [{}/{}]: {}",
                    record.source_path, record.stage, record.kind, record.message
                ));
            }
        }

        lines.join("\n")
    }
}

impl Default for BatchResult {
    fn default() -> Self {
        Self::new()
    }
}
