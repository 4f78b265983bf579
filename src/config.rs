//! Runtime configuration
//!
//! Defaults reproduce the archiver's historical behavior. A TOML file can
//! override them:
//!
//! ```toml
//! verbose = true
//! log_headers = false
//! zero_blocks = "terminate"
//! reject_zero_fields = false
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the reader treats an all-zero block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroBlockPolicy {
    /// Zero blocks are filler; scanning continues to end of stream
    #[default]
    Skip,
    /// Two consecutive zero blocks end the archive
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Echo each entry path as it is processed
    pub verbose: bool,
    /// Dump every header as it is written or read
    pub log_headers: bool,
    pub zero_blocks: ZeroBlockPolicy,
    /// Treat a mode or mtime of zero as a parse failure
    pub reject_zero_fields: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            log_headers: false,
            zero_blocks: ZeroBlockPolicy::Skip,
            reject_zero_fields: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log_headers(mut self, log_headers: bool) -> Self {
        self.log_headers = log_headers;
        self
    }

    pub fn with_zero_blocks(mut self, policy: ZeroBlockPolicy) -> Self {
        self.zero_blocks = policy;
        self
    }

    pub fn with_reject_zero_fields(mut self, reject: bool) -> Self {
        self.reject_zero_fields = reject;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TarError;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.verbose);
        assert!(!config.log_headers);
        assert_eq!(config.zero_blocks, ZeroBlockPolicy::Skip);
        assert!(config.reject_zero_fields);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("zero_blocks = \"terminate\"\n").unwrap();
        assert_eq!(config.zero_blocks, ZeroBlockPolicy::Terminate);
        assert!(config.reject_zero_fields);
        assert!(!config.verbose);
    }

    #[test]
    fn test_full_toml() {
        let text = r#"
            verbose = true
            log_headers = true
            zero_blocks = "skip"
            reject_zero_fields = false
        "#;
        let config = Config::from_toml_str(text).unwrap();
        assert_eq!(
            config,
            Config::new()
                .with_verbose(true)
                .with_log_headers(true)
                .with_reject_zero_fields(false)
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("zero_blocks = \"sometimes\"").unwrap_err();
        assert!(matches!(err, TarError::Config(_)));
    }
}
