//! Configuration shared by the writer and every reader of a lexicon.
//!
//! The lexicon file carries no header, so the record width can only be
//! recovered from this configuration. It is persisted as JSON next to the
//! lexicon files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};
use crate::storage::sorted_file::MAX_KEY_LENGTH;

/// Default maximum number of bytes stored per term.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 32;

/// Configuration for partial lexicon files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Fixed width of the term field of every record.
    #[serde(default = "default_max_term_length")]
    pub max_term_length: usize,
}

fn default_max_term_length() -> usize {
    DEFAULT_MAX_TERM_LENGTH
}

impl LexiconConfig {
    pub fn new(max_term_length: usize) -> Self {
        Self { max_term_length }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_term_length == 0 || self.max_term_length > MAX_KEY_LENGTH {
            return Err(LexisError::invalid_config(format!(
                "max_term_length must be between 1 and {MAX_KEY_LENGTH}, got {}",
                self.max_term_length
            )));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let config: LexiconConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist the configuration as JSON.
    ///
    /// The file is written to a temporary sibling first and renamed into
    /// place, so readers never observe a partially written config.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TERM_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_valid() {
        let config = LexiconConfig::default();
        assert_eq!(config.max_term_length, DEFAULT_MAX_TERM_LENGTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_length_rejected() {
        let err = LexiconConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, LexisError::InvalidConfig(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexicon.json");

        LexiconConfig::new(10).save(&path).unwrap();
        let loaded = LexiconConfig::load(&path).unwrap();
        assert_eq!(loaded.max_term_length, 10);
        assert!(!dir.path().join("lexicon.json.tmp").exists());
    }

    #[test]
    fn test_missing_field_uses_default() {
        let config: LexiconConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LexiconConfig::default());
    }

    #[test]
    fn test_oversized_length_rejected() {
        let err = LexiconConfig::new(MAX_KEY_LENGTH + 1).validate().unwrap_err();
        assert!(matches!(err, LexisError::InvalidConfig(_)));
        assert!(LexiconConfig::new(MAX_KEY_LENGTH).validate().is_ok());
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexicon.json");
        for json in [
            r#"{"max_term_length":0}"#.to_string(),
            format!(r#"{{"max_term_length":{}}}"#, usize::MAX),
        ] {
            std::fs::write(&path, json).unwrap();
            assert!(matches!(
                LexiconConfig::load(&path),
                Err(LexisError::InvalidConfig(_))
            ));
        }
    }
}
