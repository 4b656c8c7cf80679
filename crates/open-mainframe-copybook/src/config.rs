//! Conversion settings: source margins, REDEFINES fallback, and JSON output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CopybookError, Result};

/// Top-level copybook conversion configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopybookConfig {
    /// Source reading settings.
    #[serde(default)]
    pub source: SourceConfig,
    /// Layout resolution settings.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// JSON output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Fixed-format source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Ignore everything after column 72 (the identification area).
    #[serde(default = "default_strict_margins")]
    pub strict_margins: bool,
}

/// Layout resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// What to do when a REDEFINES target cannot be found.
    #[serde(default)]
    pub unresolved_redefines: UnresolvedRedefines,
}

/// Policy for REDEFINES clauses naming an unknown item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedRedefines {
    /// Fail the conversion.
    #[default]
    Error,
    /// Place the redefining item at offset 0 of the record.
    RecordStart,
}

/// JSON output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Indent the JSON document.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    /// Extension given to output files derived from the input name.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl CopybookConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CopybookError::Io {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CopybookError::Config {
            message: e.to_string(),
        })
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            strict_margins: default_strict_margins(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
            extension: default_extension(),
        }
    }
}

fn default_strict_margins() -> bool {
    true
}

fn default_pretty() -> bool {
    true
}

fn default_extension() -> String {
    "json".to_string()
}
