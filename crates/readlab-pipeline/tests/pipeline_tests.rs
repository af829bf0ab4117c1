//! End-to-end batch runs over a temporary store

use readlab_domain::traits::SummaryStore;
use readlab_domain::{ErrorRecord, ExtractMetadata, PipelineStage, Summary, SummaryLoad};
use readlab_llm::{LlmError, MockProvider};
use readlab_pipeline::{AutoExtractor, BatchRunner, CancelHandle, CancelSignal, DocumentOutcome, PipelineConfig};
use readlab_store::{FsStore, StoreError};
use readlab_summarizer::{Summarizer, SummarizerConfig};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn partial_json(title: &str) -> String {
    json!({
        "title": title,
        "authors": ["Grace Hopper"],
        "year": 2022,
        "tl_dr": format!("{} in brief.", title),
        "contributions": ["A compiler"],
        "methods": ["Case study"],
        "results": ["Fewer bugs"],
        "limitations": ["One team"],
        "tags": ["Systems"],
        "quotes": [],
        "references": []
    })
    .to_string()
}

fn summarizer(llm: MockProvider) -> Summarizer<MockProvider> {
    let config = SummarizerConfig {
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        ..Default::default()
    };
    Summarizer::new(llm, config).unwrap()
}

fn pipeline_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        worker_concurrency: 2,
        store_root: root.join("store"),
        digest_path: root.join("digest.md"),
        ..Default::default()
    }
}

fn runner(root: &Path, llm: MockProvider) -> BatchRunner<MockProvider, FsStore, AutoExtractor> {
    let config = pipeline_config(root);
    let store = FsStore::open(&config.store_root).unwrap();
    BatchRunner::new(summarizer(llm), store, AutoExtractor::new(), config).unwrap()
}

fn write_doc(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_schema_failures_are_isolated() {
    let dir = TempDir::new().unwrap();
    let bad = write_doc(dir.path(), "a.txt", "alpha document about nothing in particular");
    let good = write_doc(dir.path(), "b.txt", "beta document describing a compiler");

    // Only prompts carrying the beta text get a usable answer
    let llm = MockProvider::new("{\"title\": \"incomplete\"}");
    llm.respond_when("beta document", partial_json("Beta"));
    llm.respond_when("Draft tl_dr:", json!({"tl_dr": "Beta builds a compiler."}).to_string());
    let runner = runner(dir.path(), llm);

    let result = runner.run(vec![bad.clone(), good.clone()], CancelSignal::never()).await;

    assert_eq!(result.processed(), 2);
    assert_eq!(result.succeeded(), 1);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.outcomes[0].source_path(), key(&bad));
    assert!(matches!(result.outcomes[1], DocumentOutcome::Summarized { .. }));

    let store = runner.store();
    let record = store.load_error(&key(&bad)).unwrap().unwrap();
    assert_eq!(record.kind, "schema_validation");
    assert_eq!(record.stage, PipelineStage::Summarize);
    assert_eq!(record.attempts, 3);
    assert!(!store.summary_path(&key(&bad)).exists());
    assert!(store.summary_path(&key(&good)).exists());
}

#[tokio::test]
async fn test_success_clears_stale_error() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(dir.path(), "paper.md", "# Paper\n\nA compiler story.");

    let failing = MockProvider::new("unused");
    failing.push_error(LlmError::Authentication("no key".into()));
    let first = runner(dir.path(), failing).run(vec![doc.clone()], CancelSignal::never()).await;
    assert_eq!(first.failed(), 1);

    let llm = MockProvider::new("unused");
    llm.respond_when("CHUNK ", partial_json("Paper"));
    llm.respond_when("Draft tl_dr:", json!({"tl_dr": "A compiler story."}).to_string());
    let second_runner = runner(dir.path(), llm);
    let second = second_runner.run(vec![doc.clone()], CancelSignal::never()).await;
    assert_eq!(second.succeeded(), 1);

    let store = second_runner.store();
    assert!(store.load_error(&key(&doc)).unwrap().is_none());
    let loaded = store.load_summaries().unwrap();
    assert_eq!(loaded.summaries.len(), 1);
    assert_eq!(loaded.summaries[0].title, "Paper");
}

#[tokio::test]
async fn test_missing_file_fails_at_extract() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.txt");
    let runner = runner(dir.path(), MockProvider::default());

    let result = runner.run(vec![missing.clone()], CancelSignal::never()).await;

    let record = result.failures().next().unwrap();
    assert_eq!(record.stage, PipelineStage::Extract);
    assert_eq!(record.kind, "extraction");
    assert!(runner.store().load_error(&key(&missing)).unwrap().is_some());
}

#[tokio::test]
async fn test_empty_document_fails_at_chunk_stage() {
    let dir = TempDir::new().unwrap();
    let empty = write_doc(dir.path(), "empty.txt", "   \n\t  ");
    let llm = MockProvider::default();
    let runner = runner(dir.path(), llm.clone());

    let result = runner.run(vec![empty], CancelSignal::never()).await;

    assert_eq!(result.failures().next().unwrap().stage, PipelineStage::Chunk);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_ingest_persists_extract_only() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(dir.path(), "notes.txt", "Some\u{0}   spaced    text");
    let llm = MockProvider::default();
    let runner = runner(dir.path(), llm.clone());

    let result = runner.ingest(vec![doc.clone()], CancelSignal::never()).await;

    assert!(matches!(result.outcomes[0], DocumentOutcome::Ingested { chunks: 1, .. }));
    assert_eq!(llm.call_count(), 0);

    let store = runner.store();
    assert_eq!(store.load_extract(&key(&doc)).unwrap().unwrap(), "Some spaced text");
    let meta = store.load_extract_metadata(&key(&doc)).unwrap().unwrap();
    assert_eq!(meta.chunk_count, 1);
    assert_eq!(meta.char_len, "Some spaced text".len());
    assert!(!store.summary_path(&key(&doc)).exists());
}

#[tokio::test]
async fn test_cancelled_batch_persists_nothing() {
    let dir = TempDir::new().unwrap();
    let docs = vec![
        write_doc(dir.path(), "a.txt", "first"),
        write_doc(dir.path(), "b.txt", "second"),
    ];
    let llm = MockProvider::default();
    let runner = runner(dir.path(), llm.clone());

    let cancel = CancelHandle::new();
    cancel.cancel();
    let result = runner.run(docs.clone(), cancel.signal()).await;

    assert_eq!(result.cancelled(), 2);
    assert_eq!(result.processed(), 0);
    assert_eq!(llm.call_count(), 0);
    for doc in &docs {
        assert!(runner.store().load_extract(&key(doc)).unwrap().is_none());
        assert!(runner.store().load_error(&key(doc)).unwrap().is_none());
    }
}

#[tokio::test]
async fn test_run_and_aggregate_writes_digest() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(dir.path(), "paper.txt", "A compiler story.");
    let llm = MockProvider::new("unused");
    llm.respond_when("CHUNK ", partial_json("Compilers"));
    llm.respond_when("Draft tl_dr:", json!({"tl_dr": "A compiler story."}).to_string());
    let runner = runner(dir.path(), llm);

    let (result, report) = runner
        .run_and_aggregate(vec![doc], CancelSignal::never(), Some("2024-06-03".into()))
        .await
        .unwrap();

    assert_eq!(result.succeeded(), 1);
    assert_eq!(report.items, 1);
    let digest = fs::read_to_string(dir.path().join("digest.md")).unwrap();
    assert!(digest.starts_with("# Weekly Digest (2024-06-03)"));
    assert!(digest.contains("## Systems"));
    assert!(digest.contains("### Compilers *by Grace Hopper* (2022)"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        worker_concurrency: 0,
        ..pipeline_config(dir.path())
    };
    let store = FsStore::open(&config.store_root).unwrap();
    let result = BatchRunner::new(summarizer(MockProvider::default()), store, AutoExtractor::new(), config);
    assert!(result.is_err());
}

/// Store whose extract writes panic for one document
struct PanickingStore {
    inner: FsStore,
    poisoned: String,
}

impl SummaryStore for PanickingStore {
    type Error = StoreError;

    fn put_extract(&self, meta: &ExtractMetadata, text: &str) -> Result<(), StoreError> {
        if meta.source_path == self.poisoned {
            panic!("extract write blew up");
        }
        self.inner.put_extract(meta, text)
    }

    fn load_extract(&self, source_path: &str) -> Result<Option<String>, StoreError> {
        self.inner.load_extract(source_path)
    }

    fn put_summary(&self, summary: &Summary) -> Result<(), StoreError> {
        self.inner.put_summary(summary)
    }

    fn put_error(&self, record: &ErrorRecord) -> Result<(), StoreError> {
        self.inner.put_error(record)
    }

    fn clear_error(&self, source_path: &str) -> Result<(), StoreError> {
        self.inner.clear_error(source_path)
    }

    fn load_summaries(&self) -> Result<SummaryLoad, StoreError> {
        self.inner.load_summaries()
    }
}

#[tokio::test]
async fn test_panicked_document_leaves_error_record() {
    let dir = TempDir::new().unwrap();
    let good = write_doc(dir.path(), "good.txt", "A compiler for ships.");
    let bad = write_doc(dir.path(), "bad.txt", "A compiler for boats.");

    let config = pipeline_config(dir.path());
    let store = PanickingStore {
        inner: FsStore::open(&config.store_root).unwrap(),
        poisoned: key(&bad),
    };
    let llm = MockProvider::new("unused");
    llm.respond_when("CHUNK ", partial_json("Good"));
    llm.respond_when("Draft tl_dr:", json!({"tl_dr": "A compiler story."}).to_string());
    let runner = BatchRunner::new(summarizer(llm), store, AutoExtractor::new(), config).unwrap();

    let result = runner.run(vec![good.clone(), bad.clone()], CancelSignal::never()).await;

    assert_eq!(result.succeeded(), 1);
    assert_eq!(result.failed(), 1);
    match &result.outcomes[1] {
        DocumentOutcome::Failed(record) => {
            assert_eq!(record.source_path, key(&bad));
            assert_eq!(record.kind, "internal");
        }
        other => panic!("expected failure, got {:?}", other),
    }

    let reader = FsStore::open(dir.path().join("store")).unwrap();
    let record = reader.load_error(&key(&bad)).unwrap().unwrap();
    assert_eq!(record.kind, "internal");
    assert!(reader.load_error(&key(&good)).unwrap().is_none());
}
