//! # Introspector
//!
//! Reads the structure of an open array file back into a schema-shaped
//! [`FileDescription`]: attributes, dimensions and variables of the root and
//! of every group. Nothing is written to the source.
//!
//! Files carrying an HDF-EOS `StructMetadata.0` text attribute get its
//! parsed leaves merged into the described global attributes under dotted
//! keys (see [`parse_struct_metadata`]).
//!
//! The description renders as CDL-like text through `Display`, and
//! serializes to JSON for machine use.

mod hdfeos;
mod render;

use serde::Serialize;

use crate::schema::constants::ATTR_HDFEOS_STRUCT_METADATA;
use crate::schema::{AttributeSet, AttributeValue, DataType};
use crate::store::{ArraySource, DimensionInfo};

pub use hdfeos::{parse_struct_metadata, MetadataTree, MetadataValue};

/// One variable as found in the file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDescription {
    /// Variable name
    pub name: String,
    /// Stored element type
    pub dtype: DataType,
    /// Dimension names in axis order
    pub dimensions: Vec<String>,
    /// Current shape
    pub shape: Vec<usize>,
    /// Variable attributes
    pub attributes: AttributeSet,
}

/// Root or group contents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopeDescription {
    /// Group name; empty for the root
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Scope attributes
    pub attributes: AttributeSet,
    /// Dimensions with current length and growth flag
    pub dimensions: Vec<DimensionInfo>,
    /// Variables
    pub variables: Vec<VariableDescription>,
}

impl ScopeDescription {
    fn read(name: &str, source: &dyn ArraySource) -> Self {
        Self {
            name: name.to_string(),
            attributes: source.attributes(),
            dimensions: source.dimensions(),
            variables: source
                .variables()
                .into_iter()
                .map(|v| VariableDescription {
                    name: v.name,
                    dtype: v.dtype,
                    dimensions: v.dimensions,
                    shape: v.shape,
                    attributes: v.attributes,
                })
                .collect(),
        }
    }

    /// Look up a dimension
    pub fn dimension(&self, name: &str) -> Option<&DimensionInfo> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Look up a variable
    pub fn variable(&self, name: &str) -> Option<&VariableDescription> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Description of a whole file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileDescription {
    /// Name shown in the rendered header
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Root scope
    pub root: ScopeDescription,
    /// Groups one level below the root
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ScopeDescription>,
}

impl FileDescription {
    /// Look up a group
    pub fn group(&self, name: &str) -> Option<&ScopeDescription> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Describe an open array file
pub fn describe(source: &dyn ArraySource) -> FileDescription {
    let mut root = ScopeDescription::read("", source);

    if let Some(AttributeValue::Text(text)) = root.attributes.get(ATTR_HDFEOS_STRUCT_METADATA) {
        let merged = parse_struct_metadata(text).flatten();
        log::debug!(
            "Merging {} entries from {ATTR_HDFEOS_STRUCT_METADATA}",
            merged.len()
        );
        root.attributes.merge(&merged);
    }

    let groups = source
        .group_names()
        .into_iter()
        .filter_map(|name| {
            let group = source.group(&name)?;
            Some(ScopeDescription::read(&name, group))
        })
        .collect();

    FileDescription {
        name: String::new(),
        root,
        groups,
    }
}

/// Describe `source` and, when `verbose`, print the description to stdout
pub fn dump(source: &dyn ArraySource, name: &str, verbose: bool) -> FileDescription {
    let mut description = describe(source);
    description.name = name.to_string();
    if verbose {
        print!("{description}");
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArrayTarget, MemoryDataset, VariableDef};

    fn sample() -> MemoryDataset {
        let mut ds = MemoryDataset::new();
        ds.set_attribute("title", "sample".into()).unwrap();
        ds.create_dimension("x", Some(3)).unwrap();
        ds.create_variable(VariableDef::new("v", DataType::Float32, ["x"]))
            .unwrap();
        let group = ds.create_group("blah").unwrap();
        group.create_dimension("time", None).unwrap();
        ds
    }

    #[test]
    fn test_describe_scopes() {
        let ds = sample();
        let description = describe(&ds);
        assert_eq!(description.root.dimension("x").map(|d| d.length), Some(3));
        assert_eq!(description.root.variable("v").map(|v| v.shape.clone()), Some(vec![3]));
        let blah = description.group("blah").unwrap();
        assert!(blah.dimension("time").unwrap().unlimited);
        assert!(blah.variables.is_empty());
    }

    #[test]
    fn test_describe_is_idempotent() {
        let ds = sample();
        assert_eq!(describe(&ds), describe(&ds));
        assert_eq!(dump(&ds, "sample", false).name, "sample");
    }

    #[test]
    fn test_struct_metadata_merged_without_mutation() {
        let mut ds = MemoryDataset::new();
        ds.set_attribute(
            ATTR_HDFEOS_STRUCT_METADATA,
            "GROUP=GridStructure\n\tGROUP=GRID_1\n\t\tXDim=2400\n\tEND_GROUP=GRID_1\nEND_GROUP=GridStructure\nEND\n"
                .into(),
        )
        .unwrap();
        let description = describe(&ds);
        assert_eq!(
            description
                .root
                .attributes
                .get("GridStructure.GRID_1.XDim")
                .and_then(|v| v.as_f64()),
            Some(2400.0)
        );
        assert_eq!(ds.attributes().len(), 1);
    }

    #[test]
    fn test_json_form() {
        let json = serde_json::to_value(describe(&sample())).unwrap();
        assert_eq!(json["root"]["variables"][0]["dtype"], "float32");
        assert_eq!(json["groups"][0]["name"], "blah");
        assert!(json.get("name").is_none());
    }
}
