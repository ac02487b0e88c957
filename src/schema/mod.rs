//! # Schema Model
//!
//! Strongly-typed description of a self-describing array file: global
//! attributes, dimensions, variables and one optional level of groups.
//!
//! ## Configuration Shape
//!
//! A configuration document (JSON or TOML) carries the same abstract shape in
//! both syntaxes:
//!
//! | Section | Content |
//! |---------|---------|
//! | `global_attributes` | flat key/value attributes of the root |
//! | `dimensions` | one table per dimension: `dtype`, `size` or `dat`, `var`, attributes |
//! | `variables` | one table per variable: `dtype`, `dim`, packing keys, storage options, attributes |
//! | `groups` | one table per group with `attributes`, `dimensions`, `variables` |
//!
//! A dimension with neither `size` nor `dat` (or with `size = null`) is
//! unlimited. The classification happens once, in the loader, and is carried
//! as [`Cardinality`].
//!
//! ## Lifecycle
//!
//! A [`Schema`] is loaded (or built in code), turned into a [`ValidSchema`]
//! by [`Schema::validate`], and then handed to the compiler. A `ValidSchema`
//! cannot be mutated.

mod attributes;
/// Reserved keys and well-known attribute names.
pub mod constants;
mod dtype;
mod error;
mod loader;
mod types;
mod validation;

use std::ops::Deref;
use std::path::Path;

use crate::config::{ConfigDocument, ConfigTable};

pub use attributes::{Attribute, AttributeSet, AttributeValue};
pub use dtype::{DataType, UnknownDataType};
pub use error::SchemaError;
pub use types::{
    Cardinality, DimensionSpec, GroupSpec, PackingSpec, Schema, StorageOptions, VariableSpec,
};
pub use validation::validate_schema;

pub(crate) use loader::attribute_value;
pub(crate) use validation::{qualified, ROOT_SCOPE};

impl Schema {
    /// Load a schema from a `.json` or `.toml` file.
    ///
    /// File-based documents must carry a `global_attributes` section.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let doc = ConfigDocument::from_path(path)?;
        Self::from_document(&doc)
    }

    /// Load a schema from JSON text, held to the same rules as a file
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let doc = ConfigDocument::from_json_str(content)?;
        loader::load_schema(doc.root(), true)
    }

    /// Load a schema from TOML text, held to the same rules as a file
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        let doc = ConfigDocument::from_toml_str(content)?;
        loader::load_schema(doc.root(), true)
    }

    /// Load from a parsed document, honoring its file-based requirements
    pub fn from_document(doc: &ConfigDocument) -> Result<Self, SchemaError> {
        loader::load_schema(doc.root(), doc.is_file_based())
    }

    /// Load from an in-memory structure; `global_attributes` may be omitted
    pub fn from_config(table: &ConfigTable) -> Result<Self, SchemaError> {
        loader::load_schema(table, false)
    }

    /// Validate and freeze the schema
    pub fn validate(self) -> Result<ValidSchema, SchemaError> {
        validate_schema(&self)?;
        Ok(ValidSchema(self))
    }
}

/// A schema that passed validation and can no longer change.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSchema(Schema);

impl ValidSchema {
    /// Unwrap the inner schema, giving up the validation guarantee
    pub fn into_inner(self) -> Schema {
        self.0
    }
}

impl Deref for ValidSchema {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValue;

    const SCENARIO_A: &str = r#"
[global_attributes]
title = "Precipitable water"
Conventions = "CF-1.8"

[dimensions.time]
dtype = "i4"
units = "hours since 2000-01-01"

[dimensions.latitude]
dtype = "f4"
size = 10

[dimensions.longitude]
dtype = "f4"
size = 20

[variables.pwat]
dtype = "f8"
dim = ["time", "latitude", "longitude"]
units = "mm"
"#;

    #[test]
    fn test_toml_scenario() {
        let schema = Schema::from_toml_str(SCENARIO_A).unwrap().validate().unwrap();
        assert_eq!(schema.global_attributes.len(), 2);
        assert!(schema.dimension("time").unwrap().is_unlimited());
        assert_eq!(
            schema.dimension("latitude").unwrap().cardinality,
            Cardinality::Fixed(10)
        );
        let pwat = schema.variable("pwat").unwrap();
        assert_eq!(pwat.dimensions, vec!["time", "latitude", "longitude"]);
        assert_eq!(pwat.dtype, Some(DataType::Float64));
    }

    #[test]
    fn test_json_and_toml_agree() {
        let json = r#"{
            "global_attributes": {"title": "Precipitable water", "Conventions": "CF-1.8"},
            "dimensions": {
                "time": {"dtype": "i4", "size": null, "units": "hours since 2000-01-01"},
                "latitude": {"dtype": "f4", "size": 10},
                "longitude": {"dtype": "f4", "size": 20}
            },
            "variables": {
                "pwat": {"dtype": "f8", "dim": ["time", "latitude", "longitude"], "units": "mm"}
            }
        }"#;
        let from_json = Schema::from_json_str(json).unwrap();
        let from_toml = Schema::from_toml_str(SCENARIO_A).unwrap();
        assert_eq!(from_json, from_toml);
    }

    #[test]
    fn test_in_memory_config_without_globals() {
        let table = ConfigTable::new()
            .with(
                "dimensions",
                ConfigTable::new()
                    .with("x", ConfigTable::new().with("dtype", "i4".into()).with("size", 3i64.into()).into())
                    .into(),
            )
            .with(
                "variables",
                ConfigTable::new()
                    .with(
                        "v",
                        ConfigTable::new()
                            .with("dtype", "f4".into())
                            .with("dim", ConfigValue::List(vec!["x".into()]))
                            .into(),
                    )
                    .into(),
            );
        let schema = Schema::from_config(&table).unwrap().validate().unwrap();
        assert!(schema.global_attributes.is_empty());
        assert_eq!(schema.variable("v").unwrap().rank(), 1);
    }

    #[test]
    fn test_file_based_requires_globals() {
        let err = Schema::from_json_str(r#"{"dimensions": {}, "variables": {}}"#).unwrap_err();
        assert!(matches!(err, SchemaError::ConfigShape { .. }));
    }
}
