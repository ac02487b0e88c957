use crate::config::ConfigError;

/// Errors raised while building data bindings
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The data document could not be read or parsed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Element count does not match the declared shape
    #[error("Shape {shape:?} needs {} values, found {found}", shape.iter().product::<usize>())]
    ShapeMismatch {
        /// Requested shape
        shape: Vec<usize>,
        /// Number of values supplied
        found: usize,
    },

    /// Nested lists of unequal length
    #[error("Data entry '{path}' is not rectangular at depth {depth}")]
    Ragged {
        /// Entry name
        path: String,
        /// Nesting depth where the lengths disagree
        depth: usize,
    },

    /// Numbers and strings mixed in one array
    #[error("Data entry '{path}' mixes numbers with {found} values")]
    MixedTypes {
        /// Entry name
        path: String,
        /// Offending element kind
        found: String,
    },

    /// A value that cannot become array data
    #[error("Data entry '{path}' holds unsupported {kind} values")]
    Unsupported {
        /// Entry name
        path: String,
        /// Offending kind
        kind: String,
    },

    /// An extra global attribute in the data document is malformed
    #[error("Invalid global attribute in data: {0}")]
    Attribute(String),
}
