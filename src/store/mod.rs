//! # Array-File Collaborators
//!
//! The compiler and the introspector talk to array files only through two
//! traits:
//!
//! - [`ArrayTarget`]: create dimensions, variables and groups, set attributes
//!   and write data.
//! - [`ArraySource`]: list and read back the same structure.
//!
//! Two collaborators implement them:
//!
//! - [`MemoryDataset`]: an in-memory tree, used by tests and by callers that
//!   want to inspect a compiled result without touching disk.
//! - [`ContainerWriter`] / [`ContainerReader`]: a `.ncz` ZIP container
//!   holding a JSON manifest and one Parquet file per variable.
//!
//! ## Container Layout
//!
//! ```text
//! {name}.ncz (ZIP archive)
//! ├── mimetype                         # "application/vnd.ncgen+zip" (stored, first entry)
//! ├── manifest.json                    # structure without data (Deflate compressed)
//! ├── data/{var}.parquet               # one "values" column, row-major (stored)
//! └── groups/{group}/data/{var}.parquet
//! ```
//!
//! Unlimited dimensions grow to the largest extent written along them.
//! Variables that were written shorter read back padded with their fill value.

mod array;
mod config;
mod container_reader;
mod container_writer;
mod error;
mod manifest;
mod memory;

use serde::{Deserialize, Serialize};

use crate::schema::{AttributeSet, AttributeValue, DataType, StorageOptions};

pub use array::{TypedArray, TypedValues};
pub use config::{CompressionType, ContainerConfig};
pub use container_reader::ContainerReader;
pub use container_writer::{ContainerStats, ContainerWriter, NCZ_MIMETYPE};
pub use error::StoreError;
pub use manifest::{Manifest, ScopeManifest, MANIFEST_VERSION};
pub use memory::MemoryDataset;

/// A dimension as stored: current length and growth flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionInfo {
    /// Dimension name
    pub name: String,
    /// Current length (grows for unlimited dimensions)
    pub length: usize,
    /// True if the dimension can grow
    pub unlimited: bool,
}

/// Everything needed to create a variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    /// Variable name
    pub name: String,
    /// Stored element type
    pub dtype: DataType,
    /// Dimension names in axis order
    pub dimensions: Vec<String>,
    /// Storage options (fill value, compression hints)
    pub storage: StorageOptions,
}

impl VariableDef {
    /// Create a definition with default storage options
    pub fn new<I, S>(name: impl Into<String>, dtype: DataType, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dtype,
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            storage: StorageOptions::default(),
        }
    }

    /// Fill value used for unwritten cells
    pub fn fill_value(&self) -> f64 {
        self.storage
            .fill_value
            .or_else(|| self.dtype.default_fill())
            .unwrap_or(0.0)
    }
}

/// A variable as stored, without its data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Variable name
    pub name: String,
    /// Stored element type
    pub dtype: DataType,
    /// Dimension names in axis order
    pub dimensions: Vec<String>,
    /// Current shape, from the dimension lengths
    pub shape: Vec<usize>,
    /// Variable attributes
    pub attributes: AttributeSet,
    /// Storage options
    #[serde(default)]
    pub storage: StorageOptions,
}

/// Write side of an array-file collaborator
pub trait ArrayTarget {
    /// Set an attribute on this scope
    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), StoreError>;

    /// Create a dimension; `None` makes it unlimited
    fn create_dimension(&mut self, name: &str, length: Option<usize>) -> Result<(), StoreError>;

    /// Create a variable over existing dimensions of this scope
    fn create_variable(&mut self, def: VariableDef) -> Result<(), StoreError>;

    /// Set an attribute on a variable of this scope
    fn set_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), StoreError>;

    /// Write a variable's full data, growing unlimited dimensions as needed
    fn write(&mut self, variable: &str, data: TypedArray) -> Result<(), StoreError>;

    /// Write one record at `index` along the variable's leading unlimited dimension
    fn write_record(
        &mut self,
        variable: &str,
        index: usize,
        record: TypedArray,
    ) -> Result<(), StoreError>;

    /// Create a named sub-scope and return it
    fn create_group(&mut self, name: &str) -> Result<&mut dyn ArrayTarget, StoreError>;

    /// Existing sub-scope, for writing after creation
    fn group_mut(&mut self, name: &str) -> Option<&mut dyn ArrayTarget>;

    /// Current state of a dimension of this scope
    fn dimension(&self, name: &str) -> Option<DimensionInfo>;
}

/// Read side of an array-file collaborator
pub trait ArraySource {
    /// Attributes of this scope
    fn attributes(&self) -> AttributeSet;

    /// Dimensions of this scope in creation order
    fn dimensions(&self) -> Vec<DimensionInfo>;

    /// Variables of this scope in creation order
    fn variables(&self) -> Vec<VariableInfo>;

    /// Names of the groups directly below this scope
    fn group_names(&self) -> Vec<String>;

    /// A group directly below this scope
    fn group(&self, name: &str) -> Option<&dyn ArraySource>;

    /// A variable's data at its current shape, unwritten cells filled
    fn read(&self, variable: &str) -> Result<TypedArray, StoreError>;
}
