//! Configuration management for sql-to-xsd
//!
//! Loads generation defaults from ~/.config/sqltoxsd/config.toml, or from an
//! explicit path given on the command line.

use crate::schema::ReadOptions;
use crate::xsd::{ColumnGroup, Layout};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output document settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit relationship metadata even without the CLI flag
    pub include_relationships: bool,
    /// Wrap table elements in an unbounded `xs:choice`
    pub dataset_choice: bool,
    pub column_group: ColumnGroup,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            include_relationships: false,
            dataset_choice: layout.dataset_choice,
            column_group: layout.column_group,
        }
    }
}

/// Metadata reading settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MetadataConfig {
    /// Fail when a key references an unknown table or column
    pub strict_references: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            strict_references: true,
        }
    }
}

/// Application configuration
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub output: OutputConfig,
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Get the default config file path (~/.config/sqltoxsd/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("sqltoxsd");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// location is used if present and the built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::config_path() {
                Ok(path) if path.exists() => Self::load_from(&path),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Read and parse a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Document layout selected by this config
    pub fn layout(&self) -> Layout {
        Layout {
            dataset_choice: self.output.dataset_choice,
            column_group: self.output.column_group,
        }
    }

    /// Metadata read options, with the CLI relationship flag OR-ed in
    pub fn read_options(&self, relationships_flag: bool) -> ReadOptions {
        ReadOptions {
            include_relationships: relationships_flag || self.output.include_relationships,
            strict_references: self.metadata.strict_references,
        }
    }
}
