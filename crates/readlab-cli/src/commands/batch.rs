//! Shared setup for the batch commands.

use crate::cli::AggregateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use chrono::{Local, NaiveDate};
use readlab_aggregator::GroupBy;
use readlab_llm::{ConfiguredProvider, LlmConfig, ProviderKind};
use readlab_pipeline::{AutoExtractor, BatchRunner, CancelHandle, CancelSignal, PipelineConfig};
use readlab_store::FsStore;
use readlab_summarizer::Summarizer;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Runner type used by every batch command.
pub type Runner = BatchRunner<ConfiguredProvider, FsStore, AutoExtractor>;

const DOCUMENT_EXTENSIONS: [&str; 4] = ["pdf", "md", "markdown", "txt"];

/// Build a runner from configuration.
///
/// Ingest runs never call the model, so they get the offline provider and
/// do not need credentials.
pub fn build_runner(config: &Config, pipeline: PipelineConfig, needs_llm: bool) -> Result<Runner> {
    let provider = if needs_llm {
        config.llm.build()?
    } else {
        LlmConfig {
            provider: ProviderKind::Mock,
            ..Default::default()
        }
        .build()?
    };

    let summarizer = Summarizer::new(provider, config.summarizer.clone())?;
    pipeline.validate()?;
    let store = FsStore::open(&pipeline.store_root)?;
    Ok(BatchRunner::new(summarizer, store, AutoExtractor::new(), pipeline)?)
}

/// Pipeline settings with a command-line concurrency override.
pub fn pipeline_with_concurrency(config: &Config, concurrency: Option<usize>) -> PipelineConfig {
    let mut pipeline = config.pipeline.clone();
    if let Some(n) = concurrency {
        pipeline.worker_concurrency = n;
    }
    pipeline
}

/// Apply `--output` and `--group-by`.
pub fn apply_digest_overrides(pipeline: &mut PipelineConfig, args: &AggregateArgs) -> Result<()> {
    if let Some(output) = &args.output {
        pipeline.digest_path = output.clone();
    }
    if let Some(group_by) = &args.group_by {
        pipeline.group_by = group_by.parse::<GroupBy>().map_err(CliError::InvalidInput)?;
    }
    Ok(())
}

/// Date for the digest heading, if one was asked for.
pub fn digest_date(args: &AggregateArgs) -> Result<Option<String>> {
    if args.today {
        return Ok(Some(Local::now().format("%Y-%m-%d").to_string()));
    }
    match &args.date {
        Some(date) => {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| CliError::InvalidInput(format!("Invalid date '{}': {}", date, e)))?;
            Ok(Some(date.clone()))
        }
        None => Ok(None),
    }
}

/// Cancellation signal tripped by Ctrl+C.
pub fn cancel_on_ctrl_c() -> CancelSignal {
    let handle = CancelHandle::new();
    let signal = handle.signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling batch");
            handle.cancel();
        }
    });
    signal
}

/// Expand directories into the documents they contain.
///
/// Files named explicitly are kept whatever their extension, and missing
/// paths are passed through so the batch reports them as failures.
/// Directories are searched recursively in sorted order.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            walk(path, &mut found)?;
            found.sort();
            debug!(dir = %path.display(), documents = found.len(), "Directory scanned");
            for file in found {
                if seen.insert(file.clone()) {
                    inputs.push(file);
                }
            }
        } else if seen.insert(path.clone()) {
            inputs.push(path.clone());
        }
    }

    if inputs.is_empty() {
        return Err(CliError::InvalidInput("No documents found".to_string()));
    }
    Ok(inputs)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if is_document(&path) {
            found.push(path);
        }
    }
    Ok(())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOCUMENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn digest_args() -> AggregateArgs {
        AggregateArgs {
            output: None,
            group_by: None,
            date: None,
            today: false,
        }
    }

    #[test]
    fn test_collect_inputs_expands_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("more");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.pdf"), "x").unwrap();
        fs::write(dir.path().join("a.md"), "x").unwrap();
        fs::write(dir.path().join("image.png"), "x").unwrap();
        fs::write(nested.join("c.TXT"), "x").unwrap();

        let inputs = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            inputs,
            vec![dir.path().join("a.md"), dir.path().join("b.pdf"), nested.join("c.TXT")]
        );
    }

    #[test]
    fn test_collect_inputs_keeps_explicit_files_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes");
        fs::write(&file, "x").unwrap();
        let missing = dir.path().join("missing.pdf");

        let inputs = collect_inputs(&[file.clone(), missing.clone(), file.clone()]).unwrap();
        assert_eq!(inputs, vec![file, missing]);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(collect_inputs(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_digest_overrides() {
        let mut pipeline = PipelineConfig::default();
        let args = AggregateArgs {
            output: Some(PathBuf::from("out.md")),
            group_by: Some("week".to_string()),
            ..digest_args()
        };
        apply_digest_overrides(&mut pipeline, &args).unwrap();
        assert_eq!(pipeline.digest_path, PathBuf::from("out.md"));
        assert_eq!(pipeline.group_by, GroupBy::Week);

        let bad = AggregateArgs {
            group_by: Some("author".to_string()),
            ..digest_args()
        };
        assert!(apply_digest_overrides(&mut pipeline, &bad).is_err());
    }

    #[test]
    fn test_digest_date() {
        assert_eq!(digest_date(&digest_args()).unwrap(), None);

        let explicit = AggregateArgs {
            date: Some("2024-06-03".to_string()),
            ..digest_args()
        };
        assert_eq!(digest_date(&explicit).unwrap().as_deref(), Some("2024-06-03"));

        let invalid = AggregateArgs {
            date: Some("June 3rd".to_string()),
            ..digest_args()
        };
        assert!(digest_date(&invalid).is_err());

        let today = AggregateArgs {
            today: true,
            ..digest_args()
        };
        assert_eq!(digest_date(&today).unwrap().unwrap().len(), 10);
    }

    #[test]
    fn test_ingest_runner_needs_no_credentials() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.llm.provider = ProviderKind::OpenAi;
        let pipeline = PipelineConfig {
            store_root: dir.path().join("store"),
            ..Default::default()
        };

        assert!(build_runner(&config, pipeline.clone(), false).is_ok());
        assert!(build_runner(&config, pipeline, true).is_err());
    }
}
