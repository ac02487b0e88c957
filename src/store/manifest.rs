//! Manifest of a `.ncz` container.
//!
//! `manifest.json` carries the whole structure (attributes, dimensions,
//! variables, groups) so a reader can describe a file without touching any
//! Parquet entry.

use serde::{Deserialize, Serialize};

use crate::schema::{AttributeSet, DataType, StorageOptions};

use super::DimensionInfo;

/// Current manifest format version
pub const MANIFEST_VERSION: &str = "1.0";

/// Top-level manifest document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version (e.g., "1.0")
    pub format_version: String,
    /// ISO 8601 timestamp of when the container was written
    pub created: String,
    /// Name and version of the writing tool
    pub generator: String,
    /// Root scope, groups nested inside
    pub root: ScopeManifest,
}

impl Manifest {
    /// Wrap a root scope with version and provenance fields
    pub fn new(root: ScopeManifest) -> Self {
        Self {
            format_version: MANIFEST_VERSION.to_string(),
            created: chrono::Utc::now().to_rfc3339(),
            generator: format!("ncgen v{}", env!("CARGO_PKG_VERSION")),
            root,
        }
    }

    /// True if a reader of this crate version understands the manifest
    pub fn is_supported(&self) -> bool {
        self.format_version.split('.').next() == MANIFEST_VERSION.split('.').next()
    }
}

/// Structure of one scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeManifest {
    /// Group name; empty for the root
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Scope attributes
    #[serde(default)]
    pub attributes: AttributeSet,
    /// Dimensions with their final lengths
    #[serde(default)]
    pub dimensions: Vec<DimensionInfo>,
    /// Variables
    #[serde(default)]
    pub variables: Vec<VariableEntry>,
    /// Groups (root only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ScopeManifest>,
}

/// One variable and the entry holding its data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEntry {
    /// Variable name
    pub name: String,
    /// Stored element type
    pub dtype: DataType,
    /// Dimension names in axis order
    pub dimensions: Vec<String>,
    /// Shape of the stored data
    pub shape: Vec<usize>,
    /// Variable attributes
    #[serde(default)]
    pub attributes: AttributeSet,
    /// Storage options
    #[serde(default)]
    pub storage: StorageOptions,
    /// ZIP entry with the values; absent when nothing was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// ZIP entry path for a variable's values
pub(crate) fn data_entry(scope: &str, variable: &str) -> String {
    if scope.is_empty() {
        format!("data/{variable}.parquet")
    } else {
        format!("groups/{scope}/data/{variable}.parquet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_paths() {
        assert_eq!(data_entry("", "pwat"), "data/pwat.parquet");
        assert_eq!(data_entry("blah", "pwat"), "groups/blah/data/pwat.parquet");
    }

    #[test]
    fn test_manifest_json_shape() {
        let manifest = Manifest::new(ScopeManifest {
            attributes: AttributeSet::new().with("title", "t"),
            dimensions: vec![DimensionInfo {
                name: "time".into(),
                length: 3,
                unlimited: true,
            }],
            ..Default::default()
        });
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["format_version"], "1.0");
        assert_eq!(json["root"]["dimensions"][0]["unlimited"], true);
        assert!(json["root"].get("groups").is_none());
        assert!(json["root"].get("name").is_none());

        let back: Manifest = serde_json::from_value(json).unwrap();
        assert_eq!(back, manifest);
        assert!(back.is_supported());
    }
}
