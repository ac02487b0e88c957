//! TOML settings file support.
//!
//! Instead of passing many CLI flags, users can keep generate settings in a
//! file:
//!
//! ```toml
//! # ncgen.toml
//! [generate]
//! profile = "max-compression"
//! compression_level = 15
//! clobber = true
//! stamp_provenance = true
//! defer_unlimited = false
//! ```
//!
//! Flags given on the command line win over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use super::Profile;

/// Root of an ncgen.toml settings file.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Settings for the generate command.
    #[serde(default)]
    pub generate: GenerateSettings,
}

/// Settings for the generate command.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateSettings {
    /// Write profile name (fast, balanced, max-compression).
    pub profile: Option<String>,

    /// ZSTD compression level (1-22).
    pub compression_level: Option<i32>,

    /// Overwrite existing output files.
    pub clobber: Option<bool>,

    /// Stamp history/date_created/date_modified.
    pub stamp_provenance: Option<bool>,

    /// Allow variables over unlimited dimensions without data.
    pub defer_unlimited: Option<bool>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse settings from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML settings")
    }
}

impl GenerateSettings {
    /// Profile named in the file, if any.
    pub fn profile(&self) -> Result<Option<Profile>> {
        self.profile
            .as_deref()
            .map(Profile::from_str)
            .transpose()
            .map_err(anyhow::Error::msg)
    }
}
