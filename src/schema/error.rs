use crate::config::ConfigError;

/// Errors raised while loading or validating a schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The document could not be read or parsed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A section or entry does not have the expected shape
    #[error("Malformed configuration at '{path}': {message}")]
    ConfigShape {
        /// Location in the document, e.g. `variables.pwat.dim`
        path: String,
        /// What was wrong
        message: String,
    },

    /// A variable references a dimension that does not exist in its scope
    #[error("One of the dimensions for {variable} does not exist: '{dimension}'")]
    UnknownDimension {
        /// Offending variable (group-qualified as `group/var`)
        variable: String,
        /// Missing dimension name
        dimension: String,
    },

    /// A declared element type is not in the supported set
    #[error("Unsupported data type '{dtype}' for '{name}'")]
    UnsupportedType {
        /// Dimension or variable declaring the type
        name: String,
        /// Type string as written
        dtype: String,
    },

    /// Packing parameters are inconsistent with the declared type
    #[error("Invalid packing for variable '{variable}': {reason}")]
    InvalidPacking {
        /// Offending variable
        variable: String,
        /// What was wrong
        reason: String,
    },

    /// Two declarations share a name within one scope
    #[error("Duplicate name '{name}' in scope '{scope}'")]
    DuplicateName {
        /// Scope (`/` for the root, group name otherwise)
        scope: String,
        /// Duplicated name
        name: String,
    },
}

impl SchemaError {
    pub(crate) fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::ConfigShape {
            path: path.into(),
            message: message.into(),
        }
    }
}
