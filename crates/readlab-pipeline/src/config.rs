//! Configuration for batch runs

use crate::error::PipelineError;
use readlab_aggregator::{DigestOptions, GroupBy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the batch runner and the digest it produces
///
/// # Examples
///
/// ```
/// use readlab_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.worker_concurrency, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Documents processed at once
    pub worker_concurrency: usize,

    /// Root directory of the summary store
    pub store_root: PathBuf,

    /// Where the digest is written
    pub digest_path: PathBuf,

    /// Digest grouping
    pub group_by: GroupBy,

    /// Digest heading
    pub digest_title: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: 4,
            store_root: PathBuf::from("readlab-data"),
            digest_path: PathBuf::from("readlab-data/digest.md"),
            group_by: GroupBy::PrimaryTag,
            digest_title: "Weekly Digest".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.worker_concurrency == 0 {
            return Err(PipelineError::Config(
                "worker_concurrency must be at least 1".to_string(),
            ));
        }
        if self.store_root.as_os_str().is_empty() {
            return Err(PipelineError::Config("store_root must not be empty".to_string()));
        }
        if self.digest_path.as_os_str().is_empty() {
            return Err(PipelineError::Config("digest_path must not be empty".to_string()));
        }
        if self.digest_title.trim().is_empty() {
            return Err(PipelineError::Config("digest_title must not be empty".to_string()));
        }
        Ok(())
    }

    /// Digest options derived from this configuration
    pub fn digest_options(&self, date: Option<String>) -> DigestOptions {
        DigestOptions {
            title: self.digest_title.clone(),
            date,
            group_by: self.group_by,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, PipelineError> {
        toml::from_str(toml_str).map_err(|e| PipelineError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.worker_concurrency, 4);
        assert_eq!(config.group_by, GroupBy::PrimaryTag);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = PipelineConfig {
            worker_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_toml() {
        let parsed = PipelineConfig::from_toml("group_by = \"week\"\nworker_concurrency = 2\n").unwrap();
        assert_eq!(parsed.group_by, GroupBy::Week);
        assert_eq!(parsed.worker_concurrency, 2);
        assert_eq!(parsed.digest_title, "Weekly Digest");

        let round = PipelineConfig::from_toml(&parsed.to_toml().unwrap()).unwrap();
        assert_eq!(round, parsed);
    }

    #[test]
    fn test_digest_options() {
        let config = PipelineConfig {
            digest_title: "Lab Notes".into(),
            group_by: GroupBy::Month,
            ..Default::default()
        };
        let options = config.digest_options(Some("2024-06-01".into()));
        assert_eq!(options.title, "Lab Notes");
        assert_eq!(options.group_by, GroupBy::Month);
        assert_eq!(options.date.as_deref(), Some("2024-06-01"));
    }
}
