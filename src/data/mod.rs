//! Data arrays supplied to the compiler.
//!
//! A [`DataBindings`] maps names to [`NdArray`]s for one scope. Dimensions
//! look up their `dat` key here; variables look up their own name. Group
//! bindings nest one level, mirroring the schema.
//!
//! Data documents use the same JSON/TOML front end as schema documents:
//!
//! ```json
//! {
//!   "global_attributes": {"comment": "extra"},
//!   "time": [0, 1, 2],
//!   "pwat": [[[1.5, 2.5]]],
//!   "groups": {"blah": {"time": [0]}}
//! }
//! ```

mod array;
mod error;

use std::path::Path;

use crate::config::{ConfigDocument, ConfigTable};
use crate::schema::{attribute_value, AttributeSet};

pub use array::{NdArray, Values};
pub use error::DataError;

const KEY_GLOBAL_ATTRIBUTES: &str = "global_attributes";
const KEY_GROUPS: &str = "groups";

/// Named arrays for one scope, plus per-group bindings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBindings {
    arrays: Vec<(String, NdArray)>,
    global_attributes: AttributeSet,
    groups: Vec<(String, DataBindings)>,
}

impl DataBindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an array to a name, replacing any previous binding
    pub fn insert(&mut self, name: impl Into<String>, array: impl Into<NdArray>) {
        let name = name.into();
        let array = array.into();
        match self.arrays.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = array,
            None => self.arrays.push((name, array)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, array: impl Into<NdArray>) -> Self {
        self.insert(name, array);
        self
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&NdArray> {
        self.arrays.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// True if the name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bound names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|(n, _)| n.as_str())
    }

    /// Number of bound arrays in this scope
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// True when no arrays are bound in this scope
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Extra global attributes, written after the configured ones
    pub fn global_attributes(&self) -> &AttributeSet {
        &self.global_attributes
    }

    /// Mutable access to the extra global attributes
    pub fn global_attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.global_attributes
    }

    /// Bindings of a group
    pub fn group(&self, name: &str) -> Option<&DataBindings> {
        self.groups.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    /// Bindings of a group, created empty on first use
    pub fn group_mut(&mut self, name: &str) -> &mut DataBindings {
        let idx = match self.groups.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.groups.push((name.to_string(), DataBindings::new()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx].1
    }

    /// Builder-style group bindings
    pub fn with_group(mut self, name: impl Into<String>, bindings: DataBindings) -> Self {
        let name = name.into();
        *self.group_mut(&name) = bindings;
        self
    }

    /// Load bindings from a `.json` or `.toml` data document
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let doc = ConfigDocument::from_path(path)?;
        Self::from_table(doc.root())
    }

    /// Load bindings from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, DataError> {
        let doc = ConfigDocument::from_json_str(content)?;
        Self::from_table(doc.root())
    }

    /// Build bindings from a parsed document root
    pub fn from_table(table: &ConfigTable) -> Result<Self, DataError> {
        Self::from_scope(table, true)
    }

    fn from_scope(table: &ConfigTable, allow_groups: bool) -> Result<Self, DataError> {
        let mut bindings = DataBindings::new();
        for (key, value) in table.iter() {
            match key {
                KEY_GLOBAL_ATTRIBUTES if allow_groups => {
                    let attrs = value.as_table().ok_or_else(|| {
                        DataError::Attribute(format!("'{key}' must be a table"))
                    })?;
                    for (name, v) in attrs.iter() {
                        let path = format!("{key}.{name}");
                        let v = attribute_value(v, &path)
                            .map_err(|e| DataError::Attribute(e.to_string()))?;
                        bindings.global_attributes.insert(name, v);
                    }
                }
                KEY_GROUPS if allow_groups => {
                    let groups = value.as_table().ok_or_else(|| DataError::Unsupported {
                        path: key.to_string(),
                        kind: value.kind().to_string(),
                    })?;
                    for (name, group) in groups.iter() {
                        let group = group.as_table().ok_or_else(|| DataError::Unsupported {
                            path: format!("{key}.{name}"),
                            kind: group.kind().to_string(),
                        })?;
                        let scope = Self::from_scope(group, false)?;
                        bindings.groups.push((name.to_string(), scope));
                    }
                }
                _ => {
                    let array = NdArray::from_config_value(value, key)?;
                    bindings.insert(key, array);
                }
            }
        }
        log::debug!(
            "Loaded {} data arrays and {} group bindings",
            bindings.len(),
            bindings.groups.len()
        );
        Ok(bindings)
    }
}
