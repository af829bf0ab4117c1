//! Batch runner: one bounded task per document

use crate::cancel::CancelSignal;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::outcome::{BatchResult, DocumentOutcome};
use readlab_aggregator::{aggregate_store, AggregationReport};
use readlab_domain::traits::{Generator, SummaryStore, TextExtractor};
use readlab_domain::{unix_millis, DocumentKind, ErrorRecord, ExtractMetadata, PipelineStage};
use readlab_quality::evaluate;
use readlab_summarizer::{clean_text, split_text, Summarizer};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ingest,
    Summarize,
}

/// Runs documents through extract, chunk, summarize and persist
///
/// Documents are independent: a failure is recorded for that document and
/// the batch carries on.
pub struct BatchRunner<G, S, E>
where
    G: Generator,
{
    summarizer: Summarizer<G>,
    store: Arc<S>,
    extractor: Arc<E>,
    config: PipelineConfig,
}

impl<G, S, E> BatchRunner<G, S, E>
where
    G: Generator + Send + Sync + 'static,
    S: SummaryStore + Send + Sync + 'static,
    S::Error: Display,
    E: TextExtractor + Send + Sync + 'static,
{
    /// Create a runner, rejecting invalid configuration
    pub fn new(summarizer: Summarizer<G>, store: S, extractor: E, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            summarizer,
            store: Arc::new(store),
            extractor: Arc::new(extractor),
            config,
        })
    }

    /// Store the runner writes to
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Summarize every document in `paths`
    pub async fn run(&self, paths: Vec<PathBuf>, cancel: CancelSignal) -> BatchResult {
        self.run_mode(paths, cancel, Mode::Summarize).await
    }

    /// Extract, clean and chunk every document, persisting text and metadata only
    pub async fn ingest(&self, paths: Vec<PathBuf>, cancel: CancelSignal) -> BatchResult {
        self.run_mode(paths, cancel, Mode::Ingest).await
    }

    /// Summarize the batch, then render the digest once every document is done
    pub async fn run_and_aggregate(
        &self,
        paths: Vec<PathBuf>,
        cancel: CancelSignal,
        date: Option<String>,
    ) -> Result<(BatchResult, AggregationReport), PipelineError> {
        let result = self.run(paths, cancel).await;
        let report = self.aggregate(date)?;
        Ok((result, report))
    }

    /// Render the digest from everything in the store
    pub fn aggregate(&self, date: Option<String>) -> Result<AggregationReport, PipelineError> {
        let options = self.config.digest_options(date);
        Ok(aggregate_store(self.store.as_ref(), &self.config.digest_path, &options)?)
    }

    async fn run_mode(&self, paths: Vec<PathBuf>, cancel: CancelSignal, mode: Mode) -> BatchResult {
        let started = Instant::now();
        let mut result = BatchResult::new();
        info!(run_id = %result.run_id, documents = paths.len(), ?mode, "Batch started");

        let permits = Arc::new(Semaphore::new(self.config.worker_concurrency));
        let job = DocumentJob {
            summarizer: self.summarizer.clone(),
            store: Arc::clone(&self.store),
            extractor: Arc::clone(&self.extractor),
            mode,
        };

        let mut set = JoinSet::new();
        for (index, path) in paths.iter().cloned().enumerate() {
            let job = job.clone();
            let permits = Arc::clone(&permits);
            let mut cancel = cancel.clone();
            set.spawn(async move {
                let cancelled = || DocumentOutcome::Cancelled {
                    source_path: source_path_of(&path),
                };
                if cancel.is_cancelled() {
                    return (index, cancelled());
                }

                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (index, cancelled()),
                    permit = permits.acquire_owned() => permit,
                };
                let Ok(_permit) = permit else {
                    return (index, cancelled());
                };

                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!(source = %path.display(), "Document aborted");
                        cancelled()
                    }
                    outcome = job.process(&path) => outcome,
                };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<DocumentOutcome>> = vec![None; paths.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!(error = %e, "Document task failed"),
            }
        }

        for (slot, path) in slots.into_iter().zip(&paths) {
            let outcome = slot.unwrap_or_else(|| {
                let source_path = source_path_of(path);
                let record = failure_record(
                    &source_path,
                    PipelineStage::Summarize,
                    "internal",
                    "document task did not complete".to_string(),
                );
                if let Err(e) = self.store.put_error(&record) {
                    warn!(source = %source_path, error = %e, "Could not write error record");
                }
                DocumentOutcome::Failed(record)
            });
            result.record(outcome);
        }

        result.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %result.run_id,
            succeeded = result.succeeded(),
            failed = result.failed(),
            cancelled = result.cancelled(),
            elapsed_ms = result.elapsed_ms,
            "Batch finished"
        );
        result
    }
}

/// Everything one document task needs; cheap to clone
struct DocumentJob<G, S, E>
where
    G: Generator,
{
    summarizer: Summarizer<G>,
    store: Arc<S>,
    extractor: Arc<E>,
    mode: Mode,
}

impl<G: Generator, S, E> Clone for DocumentJob<G, S, E> {
    fn clone(&self) -> Self {
        Self {
            summarizer: self.summarizer.clone(),
            store: Arc::clone(&self.store),
            extractor: Arc::clone(&self.extractor),
            mode: self.mode,
        }
    }
}

impl<G, S, E> DocumentJob<G, S, E>
where
    G: Generator + Send + Sync + 'static,
    S: SummaryStore + Send + Sync + 'static,
    S::Error: Display,
    E: TextExtractor + Send + Sync + 'static,
{
    async fn process(&self, path: &Path) -> DocumentOutcome {
        let source_path = source_path_of(path);
        info!(source = %source_path, "Processing document");

        match self.try_process(path, &source_path).await {
            Ok(outcome) => outcome,
            Err(record) => {
                error!(
                    source = %source_path,
                    stage = %record.stage,
                    kind = %record.kind,
                    attempts = record.attempts,
                    "Document failed: {}",
                    record.message
                );
                if let Err(e) = self.store.put_error(&record) {
                    warn!(source = %source_path, error = %e, "Could not write error record");
                }
                DocumentOutcome::Failed(record)
            }
        }
    }

    async fn try_process(&self, path: &Path, source_path: &str) -> Result<DocumentOutcome, ErrorRecord> {
        let extractor = Arc::clone(&self.extractor);
        let owned = path.to_path_buf();
        let raw = tokio::task::spawn_blocking(move || extractor.extract(&owned).map_err(|e| e.to_string()))
            .await
            .map_err(|e| failure_record(source_path, PipelineStage::Extract, "internal", e.to_string()))?
            .map_err(|message| failure_record(source_path, PipelineStage::Extract, "extraction", message))?;

        let text = clean_text(&raw);
        let config = self.summarizer.config();
        let chunks = split_text(&text, config.max_chars, config.overlap)
            .map_err(|e| failure_record(source_path, PipelineStage::Chunk, "config", e.to_string()))?;
        debug!(source = %source_path, chars = text.chars().count(), chunks = chunks.len(), "Text chunked");

        let meta = ExtractMetadata {
            source_path: source_path.to_string(),
            kind: DocumentKind::from_path(path),
            char_len: text.chars().count(),
            chunk_count: chunks.len(),
            extracted_at: unix_millis(),
        };
        self.store
            .put_extract(&meta, &text)
            .map_err(|e| failure_record(source_path, PipelineStage::Persist, "store", e.to_string()))?;

        if self.mode == Mode::Ingest {
            info!(source = %source_path, chunks = meta.chunk_count, "Document ingested");
            return Ok(DocumentOutcome::Ingested {
                source_path: source_path.to_string(),
                char_len: meta.char_len,
                chunks: meta.chunk_count,
            });
        }

        let chunk_count = chunks.len();
        let summary = self
            .summarizer
            .summarize_document(source_path, chunks)
            .await
            .map_err(|f| f.to_record(source_path, unix_millis()))?;

        self.store
            .put_summary(&summary)
            .map_err(|e| failure_record(source_path, PipelineStage::Persist, "store", e.to_string()))?;
        if let Err(e) = self.store.clear_error(source_path) {
            warn!(source = %source_path, error = %e, "Could not clear stale error record");
        }

        let quality = evaluate(&summary, &text);
        debug!(
            source = %source_path,
            faithfulness = quality.faithfulness,
            field_coverage = quality.field_coverage,
            diversity = quality.diversity,
            content_richness = quality.content_richness,
            "Summary quality"
        );
        info!(source = %source_path, title = %summary.title, "Document summarized");

        Ok(DocumentOutcome::Summarized {
            source_path: source_path.to_string(),
            title: summary.title,
            chunks: chunk_count,
            quality,
        })
    }
}

fn source_path_of(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn failure_record(source_path: &str, stage: PipelineStage, kind: &str, message: String) -> ErrorRecord {
    ErrorRecord {
        source_path: source_path.to_string(),
        stage,
        kind: kind.to_string(),
        message,
        attempts: 0,
        recorded_at: unix_millis(),
    }
}
