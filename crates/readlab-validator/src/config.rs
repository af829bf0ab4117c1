//! Validator configuration

use crate::ValidatorError;
use serde::{Deserialize, Serialize};

/// Bounds applied to model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum quotes kept per partial summary
    pub max_quotes: usize,

    /// Quotes longer than this many words are dropped
    pub max_quote_words: usize,

    /// Maximum tags kept per partial summary
    pub max_tags: usize,

    /// Reject responses whose tl_dr is blank
    pub require_nonempty_tl_dr: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_quotes: 2,
            max_quote_words: 25,
            max_tags: 8,
            require_nonempty_tl_dr: true,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (wide bounds, blank tl_dr allowed)
    pub fn permissive() -> Self {
        Self {
            max_quotes: 5,
            max_quote_words: 60,
            max_tags: 16,
            require_nonempty_tl_dr: false,
        }
    }

    /// Create a strict configuration (tight bounds)
    pub fn strict() -> Self {
        Self {
            max_quotes: 1,
            max_quote_words: 20,
            max_tags: 5,
            require_nonempty_tl_dr: true,
        }
    }

    /// Check the configuration for nonsensical bounds
    pub fn validate(&self) -> Result<(), ValidatorError> {
        if self.max_tags == 0 {
            return Err(ValidatorError::Config("max_tags must be > 0".to_string()));
        }
        if self.max_quotes > 0 && self.max_quote_words == 0 {
            return Err(ValidatorError::Config(
                "max_quote_words must be > 0 when quotes are kept".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert_eq!(config.max_quotes, 2);
        assert_eq!(config.max_quote_words, 25);
        assert_eq!(config.max_tags, 8);
        assert!(config.require_nonempty_tl_dr);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = ValidationConfig::permissive();
        assert!(!config.require_nonempty_tl_dr);
        assert!(config.max_quotes > ValidationConfig::default().max_quotes);
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert_eq!(config.max_quotes, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ValidationConfig {
            max_tags: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ValidationConfig = serde_json::from_str(r#"{"max_tags": 3}"#).unwrap();
        assert_eq!(config.max_tags, 3);
        assert_eq!(config.max_quotes, 2);
    }
}
