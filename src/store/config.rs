use std::collections::HashMap;

use parquet::basic::{Compression, Encoding, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;

use crate::schema::{DataType, StorageOptions};

/// Name of the single column in every variable file
pub(crate) const VALUES_COLUMN: &str = "values";

/// Deflate level used when a variable asks for `zlib` without `complevel`
const DEFAULT_DEFLATE_LEVEL: u32 = 4;

/// Compression options for variable files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// ZSTD compression (recommended, best compression ratio)
    Zstd(i32),
    /// GZIP (deflate) at the given level, used for `zlib` variables
    Gzip(u32),
    /// Snappy compression (faster, slightly larger files)
    Snappy,
    /// No compression (fastest write, largest files)
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

impl CompressionType {
    fn to_parquet(self) -> Compression {
        match self {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Gzip(level) => {
                Compression::GZIP(GzipLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Configuration for the container writer
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Compression for variables without their own `zlib` request
    pub compression: CompressionType,

    /// Target row group size (number of values per group)
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write statistics for columns
    pub write_statistics: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::default(),
            row_group_size: 100_000,
            // 1MB data pages
            data_page_size: 1024 * 1024,
            write_statistics: true,
        }
    }
}

impl ContainerConfig {
    /// Configuration optimized for maximum compression (slower write)
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionType::Zstd(15),
            row_group_size: 200_000,
            data_page_size: 2 * 1024 * 1024,
            write_statistics: true,
        }
    }

    /// Configuration optimized for fast writing (larger files)
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::Zstd(1),
            row_group_size: 50_000,
            data_page_size: 512 * 1024,
            write_statistics: true,
        }
    }

    /// Writer properties for one variable file.
    ///
    /// `zlib` selects GZIP at `complevel`; `shuffle` on float data selects
    /// BYTE_STREAM_SPLIT for the values column.
    pub(crate) fn to_writer_properties(
        &self,
        dtype: DataType,
        storage: &StorageOptions,
        metadata: &HashMap<String, String>,
    ) -> WriterProperties {
        let compression = if storage.zlib {
            CompressionType::Gzip(storage.complevel.unwrap_or(DEFAULT_DEFLATE_LEVEL))
        } else {
            self.compression
        };

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(compression.to_parquet())
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        let column = ColumnPath::new(vec![VALUES_COLUMN.to_string()]);
        if storage.shuffle && dtype.is_float() {
            builder = builder
                .set_column_dictionary_enabled(column.clone(), false)
                .set_column_encoding(column, Encoding::BYTE_STREAM_SPLIT);
        }

        let mut kv_metadata: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: Some(v.clone()),
            })
            .collect();
        kv_metadata.sort_by(|a, b| a.key.cmp(&b.key));

        builder.set_key_value_metadata(Some(kv_metadata)).build()
    }
}
