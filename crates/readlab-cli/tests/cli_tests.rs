//! Command flows against a temporary store with the offline provider

use readlab_cli::cli::{AggregateArgs, BatchArgs, RunArgs};
use readlab_cli::commands::{execute_aggregate, execute_ingest, execute_quality, execute_run};
use readlab_cli::config::OutputFormat;
use readlab_cli::{Config, Formatter};
use readlab_llm::ProviderKind;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn offline_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.llm.provider = ProviderKind::Mock;
    config.pipeline.store_root = root.join("store");
    config.pipeline.digest_path = root.join("digest.md");
    config.summarizer.initial_backoff_ms = 1;
    config.summarizer.max_backoff_ms = 2;
    config
}

fn quiet() -> Formatter {
    Formatter::new(OutputFormat::Quiet, false)
}

fn no_digest_args() -> AggregateArgs {
    AggregateArgs {
        output: None,
        group_by: None,
        date: None,
        today: false,
    }
}

fn papers(root: &Path) -> std::path::PathBuf {
    let dir = root.join("papers");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("compilers.md"), "# Compilers\n\nA placeholder summary of compilers.").unwrap();
    fs::write(dir.join("networks.txt"), "Networks move packets between hosts.").unwrap();
    fs::write(dir.join("cover.png"), "not a document").unwrap();
    dir
}

#[tokio::test]
async fn test_run_summarizes_directory_and_writes_digest() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let args = RunArgs {
        batch: BatchArgs {
            paths: vec![papers(dir.path())],
            concurrency: Some(2),
        },
        digest: AggregateArgs {
            date: Some("2024-06-03".to_string()),
            ..no_digest_args()
        },
    };

    let result = execute_run(args, &config, &quiet()).await.unwrap();

    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.succeeded(), 2);
    let digest = fs::read_to_string(dir.path().join("digest.md")).unwrap();
    assert!(digest.starts_with("# Weekly Digest (2024-06-03)"));
    assert!(digest.contains("### compilers"));
    assert!(digest.contains("### networks"));
    assert!(digest.contains("*Total: 2 papers in 1 categories*"));
}

#[tokio::test]
async fn test_ingest_then_quality_without_summaries() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let args = BatchArgs {
        paths: vec![papers(dir.path())],
        concurrency: None,
    };

    let result = execute_ingest(args, &config, &quiet()).await.unwrap();
    assert_eq!(result.succeeded(), 2);

    let assessment = execute_quality(&config, &quiet()).unwrap();
    assert!(assessment.rows.is_empty());
    assert_eq!(assessment.coverage.summaries, 0);
}

#[tokio::test]
async fn test_quality_after_summarize() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let args = BatchArgs {
        paths: vec![papers(dir.path())],
        concurrency: None,
    };
    readlab_cli::commands::execute_summarize(args, &config, &quiet()).await.unwrap();

    let assessment = execute_quality(&config, &quiet()).unwrap();
    assert_eq!(assessment.rows.len(), 2);
    assert_eq!(assessment.missing_extracts, 0);
    for row in &assessment.rows {
        assert!((0.0..=1.0).contains(&row.report.overall()));
    }
}

#[test]
fn test_aggregate_empty_store() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let args = AggregateArgs {
        output: Some(dir.path().join("out").join("empty.md")),
        ..no_digest_args()
    };

    let report = execute_aggregate(args, &config, &quiet()).unwrap();

    assert_eq!(report.items, 0);
    let digest = fs::read_to_string(dir.path().join("out").join("empty.md")).unwrap();
    assert!(digest.contains("No summaries available."));
}
