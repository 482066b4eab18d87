// File: rusty-constraints-core/src/config.rs
// Purpose: Form-level configuration parsing from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::field_feedbacks::StopPolicy;

/// Form configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Stop policy for groups declared without one (default: first-error)
    #[serde(default)]
    pub default_stop: StopPolicy,

    /// Compare the outcomes emitted during a pass with the stored ones and
    /// warn on mismatch (default: true)
    #[serde(default = "default_true")]
    pub check_consistency: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_stop: StopPolicy::default(),
            check_consistency: default_true(),
        }
    }
}

impl FormConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(content).context("Failed to parse form configuration")
    }

    /// Load configuration from a TOML file; a missing file yields the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("No form configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form configuration: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load form configuration: {:?}", path))
    }
}
