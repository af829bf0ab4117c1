//! readlab Pipeline
//!
//! Batch processing of source documents: extraction, chunking,
//! summarization, persistence and, once the batch has joined, aggregation.
//!
//! # Overview
//!
//! - **Bounded concurrency**: one task per document on a `JoinSet`, at most
//!   `worker_concurrency` running; the summarizer separately caps
//!   generation requests
//! - **Per-document isolation**: a failure writes an error record and the
//!   batch moves on
//! - **Cancellation**: documents not yet started are reported as
//!   cancelled; running ones stop at their next await point
//!
//! # Usage
//!
//! ```no_run
//! use readlab_llm::OllamaProvider;
//! use readlab_pipeline::{AutoExtractor, BatchRunner, CancelHandle, PipelineConfig};
//! use readlab_store::FsStore;
//! use readlab_summarizer::{Summarizer, SummarizerConfig};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let store = FsStore::open(&config.store_root)?;
//! let summarizer = Summarizer::new(OllamaProvider::default_endpoint("llama3"), SummarizerConfig::default())?;
//! let runner = BatchRunner::new(summarizer, store, AutoExtractor::new(), config)?;
//!
//! let cancel = CancelHandle::new();
//! let paths = vec![PathBuf::from("papers/attention.pdf")];
//! let (result, report) = runner.run_and_aggregate(paths, cancel.signal(), None).await?;
//! println!("{}", result.summary());
//! println!("digest: {} items", report.items);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cancel;
mod config;
mod error;
mod extract;
mod outcome;
mod runner;

pub use cancel::{CancelHandle, CancelSignal};
pub use config::PipelineConfig;
pub use error::{ExtractionError, PipelineError};
pub use extract::{AutoExtractor, FileExtractor, PdfExtractor};
pub use outcome::{BatchResult, DocumentOutcome};
pub use runner::BatchRunner;
