use crate::store::StoreError;

/// Errors raised while binding data to a schema and writing it
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Data extent along a fixed dimension differs from its length
    #[error(
        "Dimension '{dimension}' has length {expected} but data for '{variable}' has {found}"
    )]
    DimensionLengthMismatch {
        /// Fixed dimension
        dimension: String,
        /// Variable whose data was being written
        variable: String,
        /// Dimension length
        expected: usize,
        /// Data extent along that axis
        found: usize,
    },

    /// Data rank differs from the number of dimension references
    #[error("Variable '{variable}' has {expected} dimensions but data has rank {found}")]
    VariableRankMismatch {
        /// Variable being written
        variable: String,
        /// Declared rank
        expected: usize,
        /// Rank of the supplied data
        found: usize,
    },

    /// A data-bound dimension or a variable has no binding
    #[error("No data bound for {kind} '{name}'")]
    MissingData {
        /// "dimension" or "variable"
        kind: &'static str,
        /// Name looked up in the data bindings (group-qualified as `group/name`)
        name: String,
    },

    /// Data cannot be converted to the declared type
    #[error("Cannot convert data for '{variable}': {reason}")]
    DataShape {
        /// Variable being written
        variable: String,
        /// What did not fit
        reason: String,
    },

    /// The array-file collaborator failed
    #[error("Array file error: {0}")]
    Collaborator(#[from] StoreError),
}

impl CompileError {
    pub(crate) fn data(variable: &str, reason: impl Into<String>) -> Self {
        CompileError::DataShape {
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }
}
