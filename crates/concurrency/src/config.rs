//! Lock manager configuration
//!
//! The surrounding engine supplies a single knob, the maximum number of
//! parallel transactions, read from TOML text or a standalone file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_core::{Error, Result};

/// Default number of transactions admitted at once
pub const DEFAULT_PARALLEL: usize = 8;

/// Configuration for [`LockManager`](crate::LockManager).
///
/// # Example
///
/// ```toml
/// # Maximum number of transactions past admission at once (minimum 1)
/// parallel = 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockingConfig {
    /// Maximum parallel transactions; values below 1 are treated as 1.
    #[serde(default = "default_parallel")]
    pub parallel: usize,
}

fn default_parallel() -> usize {
    DEFAULT_PARALLEL
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

impl LockingConfig {
    /// Config admitting `parallel` transactions at once
    pub fn with_parallel(parallel: usize) -> Self {
        Self { parallel }
    }

    /// The limit actually enforced
    pub fn effective_parallel(&self) -> usize {
        self.parallel.max(1)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Strata locking configuration
#
# Maximum number of transactions allowed past admission at once.
# Further transactions wait in arrival order. Values below 1 mean 1.
parallel = 8
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this struct.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse locking config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse locking config '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
