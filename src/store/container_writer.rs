//! # Container Writer
//!
//! [`ContainerWriter`] collects a dataset through [`ArrayTarget`] and
//! serializes it on [`ContainerWriter::close`]:
//!
//! 1. `mimetype` (stored, first entry)
//! 2. `manifest.json` (Deflate compressed)
//! 3. one Parquet file per written variable (stored, so entries stay seekable)
//!
//! Variable files are built in temp files and streamed into the archive with
//! a bounded buffer. A writer dropped without `close` removes its partial
//! output.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::schema::AttributeValue;

use super::array::TypedArray;
use super::config::{ContainerConfig, VALUES_COLUMN};
use super::container_reader::ContainerReader;
use super::error::StoreError;
use super::manifest::{data_entry, Manifest, ScopeManifest, VariableEntry};
use super::memory::{MemoryDataset, StoredVariable};
use super::{ArraySource, ArrayTarget, DimensionInfo, VariableDef};

/// MIME type of the `.ncz` container
pub const NCZ_MIMETYPE: &str = "application/vnd.ncgen+zip";

/// Parquet key-value entry holding the row-major shape, e.g. `"3,10,20"`
pub(crate) const SHAPE_METADATA_KEY: &str = "ncgen:shape";

/// Parquet key-value entry holding the declared element type
pub(crate) const DTYPE_METADATA_KEY: &str = "ncgen:dtype";

/// Statistics from a completed container write
#[derive(Debug, Clone, Default)]
pub struct ContainerStats {
    /// Variable files written
    pub variables_written: usize,
    /// Values written across all variable files
    pub values_written: u64,
    /// Groups below the root
    pub groups_written: usize,
    /// Total file size in bytes
    pub total_size_bytes: u64,
}

impl fmt::Display for ContainerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables, {} values, {} groups, {} bytes total",
            self.variables_written, self.values_written, self.groups_written, self.total_size_bytes
        )
    }
}

/// Buffer that writes Parquet data to a temp file for later ZIP inclusion.
struct ParquetTempFile {
    temp_file: NamedTempFile,
    writer: BufWriter<File>,
}

impl ParquetTempFile {
    fn new() -> std::io::Result<Self> {
        let temp_file = NamedTempFile::new()?;
        let file = temp_file.reopen()?;
        let writer = BufWriter::new(file);
        Ok(Self { temp_file, writer })
    }

    fn into_reader(mut self) -> std::io::Result<BufReader<File>> {
        self.writer.flush()?;
        let mut file = self.temp_file.reopen()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(BufReader::new(file))
    }
}

impl Write for ParquetTempFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Writer for `.ncz` containers.
///
/// Structure and data accumulate in an in-memory [`MemoryDataset`]; nothing
/// but the mimetype reaches disk before [`close`](Self::close).
pub struct ContainerWriter {
    /// Path the finished container ends up at
    output_path: PathBuf,

    /// Path being written; differs from `output_path` when appending
    write_path: PathBuf,

    /// ZIP writer, taken on close
    zip_writer: Option<ZipWriter<BufWriter<File>>>,

    config: ContainerConfig,

    dataset: MemoryDataset,

    finalized: bool,
}

impl ContainerWriter {
    /// Create a writer for a new container at `path`.
    ///
    /// Fails with [`StoreError::FileExists`] if the path exists.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_config(path, ContainerConfig::default())
    }

    /// Create a writer with custom Parquet settings
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: ContainerConfig,
    ) -> Result<Self, StoreError> {
        let output_path = path.as_ref().to_path_buf();
        if output_path.as_os_str().is_empty() {
            return Err(StoreError::InvalidFormat("Empty path".to_string()));
        }
        if output_path.exists() {
            return Err(StoreError::FileExists(
                output_path.to_string_lossy().to_string(),
            ));
        }
        Self::start(output_path.clone(), output_path, config, MemoryDataset::new())
    }

    /// Reopen an existing container for appending.
    ///
    /// The current contents are loaded into memory; `close` writes a new
    /// archive next to the original and renames it into place.
    pub fn append<P: AsRef<Path>>(path: P, config: ContainerConfig) -> Result<Self, StoreError> {
        let output_path = path.as_ref().to_path_buf();
        let dataset = ContainerReader::open(&output_path)?.into_dataset();

        let mut file_name = output_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        file_name.push(".partial");
        let write_path = output_path.with_file_name(file_name);
        if write_path.exists() {
            fs::remove_file(&write_path)?;
        }
        log::debug!("Appending to {} via {}", output_path.display(), write_path.display());
        Self::start(output_path, write_path, config, dataset)
    }

    fn start(
        output_path: PathBuf,
        write_path: PathBuf,
        config: ContainerConfig,
        dataset: MemoryDataset,
    ) -> Result<Self, StoreError> {
        if let Some(parent) = write_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&write_path)?;
        let mut zip_writer = ZipWriter::new(BufWriter::new(file));

        // mimetype MUST be uncompressed and first
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        zip_writer.start_file("mimetype", options)?;
        zip_writer.write_all(NCZ_MIMETYPE.as_bytes())?;

        Ok(Self {
            output_path,
            write_path,
            zip_writer: Some(zip_writer),
            config,
            dataset,
            finalized: false,
        })
    }

    /// Get the output path.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The dataset as written so far
    pub fn dataset(&self) -> &MemoryDataset {
        &self.dataset
    }

    /// Serialize the dataset and finalize the archive.
    pub fn close(mut self) -> Result<ContainerStats, StoreError> {
        let mut zip_writer = self.zip_writer.take().ok_or(StoreError::Closed)?;

        let mut stats = ContainerStats {
            groups_written: self.dataset.groups().len(),
            ..Default::default()
        };
        let mut pending = Vec::new();
        let mut root = self.write_scope(&self.dataset, &mut pending, &mut stats)?;
        for group in self.dataset.groups() {
            let scope = self.write_scope(group, &mut pending, &mut stats)?;
            root.groups.push(scope);
        }

        let manifest_json = serde_json::to_string_pretty(&Manifest::new(root))?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        zip_writer.start_file("manifest.json", options)?;
        zip_writer.write_all(manifest_json.as_bytes())?;

        // Variable files MUST be Stored for seekability
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        for (entry, temp_file) in pending {
            zip_writer.start_file(entry.as_str(), options)?;
            stream_copy_to_zip(temp_file.into_reader()?, &mut zip_writer)?;
        }

        let inner = zip_writer.finish()?;
        inner.into_inner().map_err(|e| {
            StoreError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to flush ZIP buffer: {}", e.error()),
            ))
        })?;

        if self.write_path != self.output_path {
            fs::rename(&self.write_path, &self.output_path)?;
        }
        stats.total_size_bytes = fs::metadata(&self.output_path)?.len();
        self.finalized = true;

        log::info!("Wrote {}: {stats}", self.output_path.display());
        Ok(stats)
    }

    /// Manifest of one scope; variable files are queued in `pending`.
    fn write_scope(
        &self,
        scope: &MemoryDataset,
        pending: &mut Vec<(String, ParquetTempFile)>,
        stats: &mut ContainerStats,
    ) -> Result<ScopeManifest, StoreError> {
        let mut variables = Vec::new();
        for stored in scope.stored_variables() {
            let array = scope.read(&stored.def.name)?;
            let data = if stored.data.is_some() && !array.is_empty() {
                let entry = data_entry(scope.name(), &stored.def.name);
                pending.push((entry.clone(), self.write_values(stored, &array)?));
                stats.variables_written += 1;
                stats.values_written += array.len() as u64;
                Some(entry)
            } else {
                None
            };
            variables.push(VariableEntry {
                name: stored.def.name.clone(),
                dtype: stored.def.dtype,
                dimensions: stored.def.dimensions.clone(),
                shape: array.shape().to_vec(),
                attributes: stored.attributes.clone(),
                storage: stored.def.storage.clone(),
                data,
            });
        }

        Ok(ScopeManifest {
            name: scope.name().to_string(),
            attributes: scope.attributes(),
            dimensions: scope.dimensions(),
            variables,
            groups: Vec::new(),
        })
    }

    fn write_values(
        &self,
        stored: &StoredVariable,
        array: &TypedArray,
    ) -> Result<ParquetTempFile, StoreError> {
        let column = array.values().to_arrow();
        let schema = Arc::new(Schema::new(vec![Field::new(
            VALUES_COLUMN,
            column.data_type().clone(),
            false,
        )]));

        let mut metadata = HashMap::new();
        metadata.insert(SHAPE_METADATA_KEY.to_string(), format_shape(array.shape()));
        metadata.insert(DTYPE_METADATA_KEY.to_string(), stored.def.dtype.to_string());
        let props =
            self.config
                .to_writer_properties(stored.def.dtype, &stored.def.storage, &metadata);

        let batch = RecordBatch::try_new(schema.clone(), vec![column])?;
        let mut writer = ArrowWriter::try_new(ParquetTempFile::new()?, schema, Some(props))?;
        writer.write(&batch)?;
        log::debug!(
            "Variable '{}': {} values, shape {:?}",
            stored.def.name,
            array.len(),
            array.shape()
        );
        Ok(writer.into_inner()?)
    }
}

impl ArrayTarget for ContainerWriter {
    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), StoreError> {
        self.dataset.set_attribute(name, value)
    }

    fn create_dimension(&mut self, name: &str, length: Option<usize>) -> Result<(), StoreError> {
        self.dataset.create_dimension(name, length)
    }

    fn create_variable(&mut self, def: VariableDef) -> Result<(), StoreError> {
        self.dataset.create_variable(def)
    }

    fn set_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), StoreError> {
        self.dataset.set_variable_attribute(variable, name, value)
    }

    fn write(&mut self, variable: &str, data: TypedArray) -> Result<(), StoreError> {
        self.dataset.write(variable, data)
    }

    fn write_record(
        &mut self,
        variable: &str,
        index: usize,
        record: TypedArray,
    ) -> Result<(), StoreError> {
        self.dataset.write_record(variable, index, record)
    }

    fn create_group(&mut self, name: &str) -> Result<&mut dyn ArrayTarget, StoreError> {
        self.dataset.create_group(name)
    }

    fn group_mut(&mut self, name: &str) -> Option<&mut dyn ArrayTarget> {
        self.dataset.group_mut(name)
    }

    fn dimension(&self, name: &str) -> Option<DimensionInfo> {
        self.dataset.dimension(name)
    }
}

impl Drop for ContainerWriter {
    fn drop(&mut self) {
        if !self.finalized {
            self.zip_writer.take();
            log::warn!(
                "ContainerWriter for {} dropped without close(); removing partial output",
                self.output_path.display()
            );
            let _ = fs::remove_file(&self.write_path);
        }
    }
}

pub(crate) fn format_shape(shape: &[usize]) -> String {
    shape
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Copy data from a reader to a ZIP writer with bounded memory.
const STREAM_COPY_BUFFER_SIZE: usize = 64 * 1024;

fn stream_copy_to_zip<R: Read, W: Write + Seek>(
    mut reader: R,
    zip_writer: &mut ZipWriter<W>,
) -> std::io::Result<u64> {
    let mut buffer = [0u8; STREAM_COPY_BUFFER_SIZE];
    let mut total_written = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        zip_writer.write_all(&buffer[..bytes_read])?;
        total_written += bytes_read as u64;
    }

    Ok(total_written)
}
