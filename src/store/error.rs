/// Errors raised by array-file collaborators
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// JSON manifest error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The file is not a valid container
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A dimension, variable or group does not exist
    #[error("{kind} not found: '{name}'")]
    NotFound {
        /// What was looked up
        kind: &'static str,
        /// Name looked up
        name: String,
    },

    /// A dimension, variable or group already exists
    #[error("{kind} already exists: '{name}'")]
    AlreadyExists {
        /// What was created
        kind: &'static str,
        /// Duplicated name
        name: String,
    },

    /// The output path already exists
    #[error("File already exists: {0}")]
    FileExists(String),

    /// Written data does not fit the variable's dimensions
    #[error("Cannot write {variable}: {reason}")]
    ShapeMismatch {
        /// Variable written
        variable: String,
        /// What did not fit
        reason: String,
    },

    /// Groups nest at most one level below the root
    #[error("Cannot create group '{0}': groups nest only one level deep")]
    NestingTooDeep(String),

    /// The writer was used after it was closed
    #[error("Container already closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, name: &str) -> Self {
        StoreError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub(crate) fn shape(variable: &str, reason: impl Into<String>) -> Self {
        StoreError::ShapeMismatch {
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }
}
