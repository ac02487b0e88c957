//! # Configuration Documents
//!
//! Schema configurations arrive as loosely-typed nested documents in one of two
//! concrete syntaxes that carry the same abstract shape:
//!
//! - **TOML** (nested tables), e.g. `example_nc_config.toml`
//! - **JSON** (nested objects), where `size = null` may mark an unlimited dimension
//!
//! Both are converted into a single tagged-union [`ConfigValue`] tree that keeps
//! the author's key order. The strict mapping into schema types lives in
//! [`crate::schema`].
//!
//! ```rust
//! use ncgen::config::ConfigDocument;
//!
//! let doc = ConfigDocument::from_toml_str(r#"
//!     [global_attributes]
//!     title = "demo"
//!
//!     [dimensions.time]
//!     dtype = "i4"
//! "#)?;
//! assert!(doc.root().get("dimensions").is_some());
//! # Ok::<(), ncgen::config::ConfigError>(())
//! ```

mod error;
mod value;

pub use error::ConfigError;
pub use value::{ConfigTable, ConfigValue};

use std::path::{Path, PathBuf};

/// Concrete syntax of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// Nested-object syntax (`.json`)
    Json,
    /// Nested-table syntax (`.toml`)
    Toml,
}

impl ConfigFormat {
    /// Detect the syntax from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: ext,
            }),
        }
    }
}

/// A parsed configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: ConfigTable,
    source: Option<PathBuf>,
}

impl ConfigDocument {
    /// Wrap an already-built table (in-memory source).
    pub fn from_table(root: ConfigTable) -> Self {
        Self { root, source: None }
    }

    /// Load a document from disk, choosing the syntax by extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut doc = match format {
            ConfigFormat::Json => Self::from_json_str(&content)?,
            ConfigFormat::Toml => Self::from_toml_str(&content)?,
        };
        doc.source = Some(path.to_path_buf());
        log::debug!("Loaded {:?} configuration from {}", format, path.display());
        Ok(doc)
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        match ConfigValue::from_json(value) {
            ConfigValue::Table(root) => Ok(Self::from_table(root)),
            other => Err(ConfigError::NotATable(other.kind().to_string())),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        match ConfigValue::from_toml(toml::Value::Table(table)) {
            ConfigValue::Table(root) => Ok(Self::from_table(root)),
            other => Err(ConfigError::NotATable(other.kind().to_string())),
        }
    }

    /// Top-level table
    pub fn root(&self) -> &ConfigTable {
        &self.root
    }

    /// File the document was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// True when the document came from a file rather than memory
    pub fn is_file_based(&self) -> bool {
        self.source.is_some()
    }

    /// Consume the document, returning its root table
    pub fn into_root(self) -> ConfigTable {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("cfg.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        let err = ConfigFormat::from_path(Path::new("cfg.yaml")).unwrap_err();
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn test_toml_and_json_agree() {
        let toml_doc = ConfigDocument::from_toml_str(
            r#"
            [dimensions.lat]
            dtype = "f4"
            dat = "lat"
            units = "degrees_north"

            [dimensions.time]
            dtype = "i4"
            "#,
        )
        .unwrap();
        let json_doc = ConfigDocument::from_json_str(
            r#"{"dimensions": {
                "lat": {"dtype": "f4", "dat": "lat", "units": "degrees_north"},
                "time": {"dtype": "i4"}
            }}"#,
        )
        .unwrap();
        assert_eq!(toml_doc.root(), json_doc.root());
    }

    #[test]
    fn test_key_order_preserved() {
        let doc = ConfigDocument::from_json_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&str> = doc.root().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_json_root_must_be_object() {
        let err = ConfigDocument::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::NotATable(_)));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"variables": {}}"#).unwrap();
        let doc = ConfigDocument::from_path(&path).unwrap();
        assert!(doc.is_file_based());
        assert_eq!(doc.source(), Some(path.as_path()));
    }
}
