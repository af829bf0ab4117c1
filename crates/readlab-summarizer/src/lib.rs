//! readlab Summarizer
//!
//! Turns a document's chunks into one schema-valid `Summary` using a
//! map-reduce pass over an unreliable text generator.
//!
//! # Architecture
//!
//! ```text
//! Text → split_text → Chunks ─┬─ map (one request per chunk) ─┐
//!                             └─ ...                          ├─ reduce_partials → coherence pass → Summary
//!                                                             ┘
//! ```
//!
//! Every response goes through `readlab-validator`. Malformed responses are
//! retried with a stricter prompt, transient failures are retried with
//! exponential backoff, and everything is bounded by `RetryState`.
//!
//! # Example Usage
//!
//! ```no_run
//! use readlab_summarizer::{split_text, Summarizer, SummarizerConfig};
//! use readlab_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SummarizerConfig::default();
//! let chunks = split_text("Some document text.", config.max_chars, config.overlap)?;
//!
//! let summarizer = Summarizer::new(MockProvider::default(), config)?;
//! let summary = summarizer.summarize_document("papers/p1.txt", chunks).await?;
//! println!("{}", summary.tl_dr);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod prompt;
mod reduce;
mod retry;
mod summarizer;


pub use chunking::{clean_text, split_text};
pub use config::SummarizerConfig;
pub use error::{FailureKind, SummarizationFailure, SummarizerError};
pub use prompt::{PromptBuilder, SYSTEM_PROMPT};
pub use reduce::{reduce_partials, trim_to_word_boundary};
pub use retry::{AttemptError, BackoffPolicy, NextStep, RetryState};
pub use summarizer::Summarizer;
