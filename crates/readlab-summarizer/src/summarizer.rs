//! Core Summarizer implementation

use crate::config::SummarizerConfig;
use crate::error::{FailureKind, SummarizationFailure, SummarizerError};
use crate::prompt::{PromptBuilder, SYSTEM_PROMPT};
use crate::reduce::{reduce_partials, trim_to_word_boundary};
use crate::retry::{AttemptError, NextStep, RetryState};
use readlab_domain::traits::Generator;
use readlab_domain::{unix_millis, Chunk, GenerationError, GenerationRequest, GenerationResponse, PartialSummary, PipelineStage, Summary};
use readlab_validator::{
    partial_summary_schema, tl_dr_schema, ValidationOutcome, Validator, PARTIAL_SCHEMA_NAME, TL_DR_SCHEMA_NAME,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Map-reduce summarizer over a `Generator`
///
/// Cheap to clone; clones share the generator and the generation
/// semaphore, so `generation_concurrency` caps in-flight requests across
/// every document using this summarizer.
pub struct Summarizer<G>
where
    G: Generator,
{
    generator: Arc<G>,
    validator: Arc<Validator>,
    config: Arc<SummarizerConfig>,
    permits: Arc<Semaphore>,
}

impl<G: Generator> Clone for Summarizer<G> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            validator: Arc::clone(&self.validator),
            config: Arc::clone(&self.config),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<G> Summarizer<G>
where
    G: Generator + Send + Sync + 'static,
{
    /// Create a new Summarizer, rejecting invalid configuration
    pub fn new(generator: G, config: SummarizerConfig) -> Result<Self, SummarizerError> {
        config.validate()?;
        Ok(Self {
            generator: Arc::new(generator),
            validator: Arc::new(Validator::new(config.validation.clone())),
            permits: Arc::new(Semaphore::new(config.generation_concurrency)),
            config: Arc::new(config),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Name of the model behind the generator
    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Summarize one document from its chunks
    ///
    /// Runs the map step concurrently, reduces the partials in chunk order,
    /// then asks for one coherent tl_dr. Fails if any chunk exhausts its
    /// retries; all map tasks are joined before the failure is reported.
    pub async fn summarize_document(
        &self,
        source_path: &str,
        chunks: Vec<Chunk>,
    ) -> Result<Summary, SummarizationFailure> {
        if chunks.is_empty() {
            return Err(SummarizationFailure {
                stage: PipelineStage::Chunk,
                kind: FailureKind::Unrecoverable,
                attempts: 0,
                message: "document has no text to summarize".to_string(),
            });
        }

        let total = chunks.len();
        info!(source = %source_path, chunks = total, "Summarizing document");

        let partials = self.map_chunks(chunks).await?;
        let mut summary = reduce_partials(&partials, source_path);

        let limits = &self.config.validation;
        summary.tags.truncate(limits.max_tags);
        summary.quotes.truncate(limits.max_quotes);

        let tl_dr = self.coherence_pass(&summary).await?;
        summary.tl_dr = trim_to_word_boundary(&tl_dr, self.config.tl_dr_max_chars);
        summary.model = Some(self.generator.model_name().to_string());
        summary.generated_at = unix_millis();

        if let Err(reasons) = self.validator.validate_summary(&summary) {
            let message = reasons.iter().map(|r| r.to_string()).collect::<Vec<_>>().join("; ");
            return Err(SummarizationFailure::new(FailureKind::SchemaValidation, 0, message));
        }

        info!(source = %source_path, title = %summary.title, "Document summarized");
        Ok(summary)
    }

    async fn map_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<PartialSummary>, SummarizationFailure> {
        let total = chunks.len();
        let mut set = JoinSet::new();
        for chunk in chunks {
            let this = self.clone();
            set.spawn(async move {
                let index = chunk.index;
                (index, this.map_chunk(&chunk, total).await)
            });
        }

        let mut partials = Vec::with_capacity(total);
        let mut failure: Option<(usize, SummarizationFailure)> = None;
        while let Some(joined) = set.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => (
                    usize::MAX,
                    Err(SummarizationFailure::new(
                        FailureKind::Internal,
                        0,
                        format!("map task failed: {}", e),
                    )),
                ),
            };
            match outcome {
                Ok(partial) => partials.push(partial),
                Err(f) => {
                    warn!(chunk = index, error = %f, "Chunk failed");
                    // Report the lowest failing chunk so the outcome does not
                    // depend on completion order
                    if failure.as_ref().map(|(i, _)| index < *i).unwrap_or(true) {
                        failure = Some((index, f));
                    }
                }
            }
        }

        if let Some((_, f)) = failure {
            return Err(f);
        }
        partials.sort_by_key(|p| p.chunk_index);
        Ok(partials)
    }

    async fn map_chunk(&self, chunk: &Chunk, total: usize) -> Result<PartialSummary, SummarizationFailure> {
        self.generate_validated(
            |strict| {
                let prompt = PromptBuilder::new().strict(strict).map_prompt(chunk, total);
                debug!(chunk = chunk.index, prompt_chars = prompt.len(), strict, "Map request");
                request(prompt, PARTIAL_SCHEMA_NAME, partial_summary_schema(), strict)
            },
            |response, strict| self.validator.validate_partial(response, chunk, strict),
        )
        .await
    }

    async fn coherence_pass(&self, summary: &Summary) -> Result<String, SummarizationFailure> {
        self.generate_validated(
            |strict| {
                let prompt = PromptBuilder::new().strict(strict).coherence_prompt(
                    &summary.tl_dr,
                    &summary.contributions,
                    &summary.results,
                );
                debug!(prompt_chars = prompt.len(), strict, "Coherence request");
                request(prompt, TL_DR_SCHEMA_NAME, tl_dr_schema(), strict)
            },
            |response, strict| self.validator.validate_tl_dr(response, strict),
        )
        .await
    }

    /// Generate and validate until valid or the retry budget is spent
    async fn generate_validated<T, B, V>(&self, build: B, validate: V) -> Result<T, SummarizationFailure>
    where
        B: Fn(bool) -> GenerationRequest,
        V: Fn(&GenerationResponse, bool) -> ValidationOutcome<T>,
    {
        let mut state = RetryState::new(self.config.max_attempts, self.config.backoff());
        loop {
            let attempt = state.begin_attempt();
            let strict = state.strict();

            let error = match self.call(build(strict)).await {
                Ok(response) => match validate(&response, strict) {
                    ValidationOutcome::Valid(value) => return Ok(value),
                    ValidationOutcome::Malformed(reasons) => AttemptError::Schema(
                        reasons.iter().map(|r| r.to_string()).collect::<Vec<_>>().join("; "),
                    ),
                    ValidationOutcome::Unrecoverable(reason) => AttemptError::Unrecoverable(reason),
                },
                Err(e) => e,
            };

            match state.record(error) {
                NextStep::Retry { delay, strict } => {
                    debug!(
                        attempt,
                        max_attempts = state.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        strict,
                        error = ?state.last_error(),
                        "Retrying generation"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                NextStep::GiveUp(failure) => return Err(failure),
            }
        }
    }

    /// One bounded generation call
    ///
    /// The permit moves into the blocking task, so a call that outlives its
    /// timeout still counts against the concurrency cap until it returns.
    async fn call(&self, request: GenerationRequest) -> Result<GenerationResponse, AttemptError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| AttemptError::Fatal("generation limiter closed".to_string()))?;

        let generator = Arc::clone(&self.generator);
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            generator.generate(&request).map_err(Into::<GenerationError>::into)
        });

        match timeout(self.config.generation_timeout(), handle).await {
            Err(_) => Err(AttemptError::Timeout),
            Ok(Err(e)) => Err(AttemptError::Fatal(format!("generation task failed: {}", e))),
            Ok(Ok(result)) => result.map_err(AttemptError::from),
        }
    }
}

fn request(prompt: String, schema_name: &str, schema: serde_json::Value, strict: bool) -> GenerationRequest {
    let request = GenerationRequest::new(SYSTEM_PROMPT, prompt, schema_name, schema);
    if strict {
        request.strict()
    } else {
        request
    }
}
