use std::path::PathBuf;

/// Errors that can occur while reading a configuration document
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file extension does not name a supported syntax
    #[error(
        "The following file extension for the configuration file is not supported: '{extension}' ({})",
        path.display()
    )]
    UnsupportedFormat {
        /// Offending file
        path: PathBuf,
        /// Extension found (lowercased, may be empty)
        extension: String,
    },

    /// JSON syntax error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML syntax error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document root is not a table/object
    #[error("Configuration root must be a table, found {0}")]
    NotATable(String),
}
