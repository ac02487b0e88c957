//! # ncgen - Declarative Gridded-File Generator
//!
//! `ncgen` turns a declarative description of a scientific gridded-data file
//! (global attributes, dimensions, variables, one optional level of groups)
//! into a self-describing array file, and describes existing files back in
//! the same terms.
//!
//! ## Key Features
//!
//! - **Loose configuration, strict schema**: JSON or TOML documents are
//!   mapped into a typed [`schema::Schema`]; unlimited dimensions are
//!   classified once, at load time.
//!
//! - **Validation before I/O**: dimension references, element types and
//!   packing parameters are checked by [`schema::Schema::validate`] before
//!   anything is created.
//!
//! - **Packing and coercion**: `scale_factor`/`add_offset` packing, fill
//!   substitution for NaN and `least_significant_digit` quantization happen
//!   while data is written.
//!
//! - **Single-file container**: the `.ncz` container is a ZIP archive with a
//!   JSON manifest and one Parquet file per variable, readable by any Parquet
//!   tool.
//!
//! - **Introspection**: [`dump::describe`] reads any [`store::ArraySource`]
//!   back into a schema-shaped description with an `ncdump -h`-like
//!   rendering, expanding embedded HDF-EOS `StructMetadata`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ncgen::prelude::*;
//!
//! let data = DataBindings::from_path("pwat_data.json")?;
//! let report = generate(
//!     "pwat.toml",
//!     &data,
//!     "pwat.ncz",
//!     ContainerConfig::default(),
//!     &CompileOptions::default(),
//!     false,
//! )?;
//! println!("{}", report.summary);
//!
//! let reader = ContainerReader::open("pwat.ncz")?;
//! print!("{}", describe(&reader));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Container Layout
//!
//! ```text
//! pwat.ncz
//! ├── mimetype                        application/vnd.ncgen+zip (stored, first)
//! ├── manifest.json                   structure, attributes, storage options
//! ├── data/pwat.parquet               one "values" column, row-major
//! └── groups/blah/data/pwat.parquet
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod compiler;
pub mod config;
pub mod data;
pub mod dump;
pub mod generate;
pub mod schema;
pub mod store;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::compiler::{append, compile, CompileError, CompileOptions, CompileSummary};
    pub use crate::config::{ConfigDocument, ConfigError, ConfigTable, ConfigValue};
    pub use crate::data::{DataBindings, DataError, NdArray};
    pub use crate::dump::{describe, dump, parse_struct_metadata, FileDescription};
    pub use crate::generate::{generate, generate_open, GenerateReport, NcgenError};
    pub use crate::schema::{
        AttributeSet, AttributeValue, DataType, DimensionSpec, GroupSpec, PackingSpec, Schema,
        SchemaError, ValidSchema, VariableSpec,
    };
    pub use crate::store::{
        ArraySource, ArrayTarget, CompressionType, ContainerConfig, ContainerReader,
        ContainerStats, ContainerWriter, MemoryDataset, StoreError,
    };
}
