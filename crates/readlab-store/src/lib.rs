//! readlab Storage Layer
//!
//! Implements the `SummaryStore` trait on top of a plain directory tree:
//!
//! ```text
//! <root>/extracts/<key>.txt          cleaned text
//! <root>/extracts/<key>.meta.json    extract metadata
//! <root>/summaries/<key>.json        summary
//! <root>/errors/<key>.error.json     error record
//! ```
//!
//! Every write goes to a temp file in the target directory and is renamed
//! into place, so readers never observe a half-written file.
//!
//! # Examples
//!
//! ```no_run
//! use readlab_store::FsStore;
//!
//! let store = FsStore::open("./readlab-data").unwrap();
//! ```

#![warn(missing_docs)]

use readlab_domain::traits::SummaryStore;
use readlab_domain::{ErrorRecord, ExtractMetadata, MalformedEntry, Summary, SummaryLoad};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const EXTRACTS_DIR: &str = "extracts";
const SUMMARIES_DIR: &str = "summaries";
const ERRORS_DIR: &str = "errors";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage root could not be prepared
    #[error("Cannot initialize store at {path}: {source}")]
    Root {
        /// Root directory
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

/// Filesystem-backed store
///
/// Cheap to clone; holds only the root path. Each document maps to its own
/// set of files, so concurrent writers for different documents never touch
/// the same file.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        for dir in [EXTRACTS_DIR, SUMMARIES_DIR, ERRORS_DIR] {
            fs::create_dir_all(root.join(dir)).map_err(|source| StoreError::Root {
                path: root.clone(),
                source,
            })?;
        }
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the summary of a document
    pub fn summary_path(&self, source_path: &str) -> PathBuf {
        self.root
            .join(SUMMARIES_DIR)
            .join(format!("{}.json", document_key(source_path)))
    }

    /// File holding the error record of a document
    pub fn error_path(&self, source_path: &str) -> PathBuf {
        self.root
            .join(ERRORS_DIR)
            .join(format!("{}.error.json", document_key(source_path)))
    }

    fn extract_path(&self, source_path: &str) -> PathBuf {
        self.root
            .join(EXTRACTS_DIR)
            .join(format!("{}.txt", document_key(source_path)))
    }

    fn meta_path(&self, source_path: &str) -> PathBuf {
        self.root
            .join(EXTRACTS_DIR)
            .join(format!("{}.meta.json", document_key(source_path)))
    }

    /// Load the extract metadata of a document, if stored
    pub fn load_extract_metadata(&self, source_path: &str) -> Result<Option<ExtractMetadata>, StoreError> {
        read_json_opt(&self.meta_path(source_path))
    }

    /// Load the error record of a document, if any
    pub fn load_error(&self, source_path: &str) -> Result<Option<ErrorRecord>, StoreError> {
        read_json_opt(&self.error_path(source_path))
    }

    /// Load every stored error record, ordered by source path
    pub fn load_errors(&self) -> Result<Vec<ErrorRecord>, StoreError> {
        let mut records = Vec::new();
        for path in list_files(&self.root.join(ERRORS_DIR), ".error.json")? {
            match read_json::<ErrorRecord>(&path) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable error record"),
            }
        }
        records.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        Ok(records)
    }
}

impl SummaryStore for FsStore {
    type Error = StoreError;

    fn put_extract(&self, meta: &ExtractMetadata, text: &str) -> Result<(), Self::Error> {
        write_atomic(&self.extract_path(&meta.source_path), text.as_bytes())?;
        write_json(&self.meta_path(&meta.source_path), meta)?;
        debug!(source = %meta.source_path, chars = meta.char_len, "Stored extract");
        Ok(())
    }

    fn load_extract(&self, source_path: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.extract_path(source_path)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_summary(&self, summary: &Summary) -> Result<(), Self::Error> {
        write_json(&self.summary_path(&summary.source_path), summary)?;
        debug!(source = %summary.source_path, "Stored summary");
        Ok(())
    }

    fn put_error(&self, record: &ErrorRecord) -> Result<(), Self::Error> {
        write_json(&self.error_path(&record.source_path), record)
    }

    fn clear_error(&self, source_path: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.error_path(source_path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_summaries(&self) -> Result<SummaryLoad, Self::Error> {
        let mut load = SummaryLoad::default();
        for path in list_files(&self.root.join(SUMMARIES_DIR), ".json")? {
            match read_json::<Summary>(&path) {
                Ok(summary) => load.summaries.push(summary),
                Err(e) => load.malformed.push(MalformedEntry {
                    path,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(load)
    }
}

/// Stable file key for a document
///
/// Sanitized file stem plus the first 12 hex characters of the SHA-256 of
/// the full source path, so equal stems in different directories do not
/// collide.
pub fn document_key(source_path: &str) -> String {
    let stem = Path::new(source_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    if sanitized.is_empty() {
        sanitized.push_str("document");
    }

    let mut hasher = Sha256::new();
    hasher.update(source_path.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    format!("{}-{}", sanitized, &hash[..12])
}

/// Write `bytes` to `path` through a temp file and an atomic rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Files in `dir` ending with `suffix`, sorted by name
fn list_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_match = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(suffix) && !n.starts_with('.'))
            .unwrap_or(false);
        if is_match && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_is_stable() {
        let a = document_key("papers/attention.pdf");
        let b = document_key("papers/attention.pdf");
        assert_eq!(a, b);
        assert!(a.starts_with("attention-"));
        assert_eq!(a.len(), "attention-".len() + 12);
    }

    #[test]
    fn test_document_key_distinguishes_directories() {
        assert_ne!(document_key("a/paper.pdf"), document_key("b/paper.pdf"));
    }

    #[test]
    fn test_document_key_sanitizes_stem() {
        let key = document_key("/tmp/My Paper (v2).pdf");
        assert!(key.starts_with("My_Paper__v2_-"));
        let empty = document_key("/");
        assert!(empty.starts_with("document-"));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
