//! Write profiles for common use cases.
//!
//! Profiles provide sensible defaults for container compression, hiding
//! low-level Parquet settings from end users.

use std::fmt;
use std::str::FromStr;

use ncgen::store::{CompressionType, ContainerConfig};

/// Write profiles for common use cases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    /// Prioritize speed over compression.
    ///
    /// - Compression: ZSTD level 1
    /// - Row group size: 50,000 values
    Fast,

    /// Balance between speed and compression (default).
    ///
    /// - Compression: ZSTD level 3
    /// - Row group size: 100,000 values
    #[default]
    Balanced,

    /// Maximum compression, slower writes.
    ///
    /// - Compression: ZSTD level 15
    /// - Row group size: 200,000 values
    MaxCompression,
}

impl Profile {
    /// Returns the ZSTD compression level for this profile.
    pub fn compression_level(&self) -> i32 {
        match self {
            Profile::Fast => 1,
            Profile::Balanced => 3,
            Profile::MaxCompression => 15,
        }
    }

    /// Container configuration for this profile, with an optional ZSTD level override.
    pub fn container_config(&self, compression_level: Option<i32>) -> ContainerConfig {
        let mut config = match self {
            Profile::Fast => ContainerConfig::fast_write(),
            Profile::Balanced => ContainerConfig::default(),
            Profile::MaxCompression => ContainerConfig::max_compression(),
        };
        config.compression =
            CompressionType::Zstd(compression_level.unwrap_or(self.compression_level()));
        config
    }

    /// Returns all available profile names.
    pub fn variants() -> &'static [&'static str] {
        &["fast", "balanced", "max-compression"]
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Fast => write!(f, "fast"),
            Profile::Balanced => write!(f, "balanced"),
            Profile::MaxCompression => write!(f, "max-compression"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Profile::Fast),
            "balanced" | "default" => Ok(Profile::Balanced),
            "max-compression" | "maxcompression" | "max" => Ok(Profile::MaxCompression),
            _ => Err(format!(
                "Unknown profile '{}'. Valid options: {}",
                s,
                Profile::variants().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let balanced = Profile::default();
        assert_eq!(balanced, Profile::Balanced);
        assert_eq!(balanced.compression_level(), 3);
        assert_eq!(balanced.container_config(None).compression, CompressionType::Zstd(3));
        assert_eq!(balanced.container_config(None).row_group_size, 100_000);
    }

    #[test]
    fn test_level_override() {
        let config = Profile::MaxCompression.container_config(Some(19));
        assert_eq!(config.compression, CompressionType::Zstd(19));
        assert_eq!(config.row_group_size, 200_000);
        assert_eq!(
            Profile::Fast.container_config(None).compression,
            CompressionType::Zstd(1)
        );
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!(Profile::from_str("fast").unwrap(), Profile::Fast);
        assert_eq!(Profile::from_str("BALANCED").unwrap(), Profile::Balanced);
        assert_eq!(
            Profile::from_str("max-compression").unwrap(),
            Profile::MaxCompression
        );
        assert!(Profile::from_str("invalid").is_err());
    }
}
