use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use zip::ZipArchive;

use crate::schema::{AttributeSet, DataType};

use super::array::{TypedArray, TypedValues};
use super::container_writer::{format_shape, NCZ_MIMETYPE, SHAPE_METADATA_KEY};
use super::error::StoreError;
use super::manifest::{Manifest, ScopeManifest};
use super::memory::MemoryDataset;
use super::{ArraySource, ArrayTarget, DimensionInfo, VariableDef, VariableInfo};

type Archive = ZipArchive<BufReader<File>>;

/// Reader for `.ncz` containers.
///
/// Opening loads the manifest and every variable file; the result is served
/// through [`ArraySource`].
#[derive(Debug)]
pub struct ContainerReader {
    path: PathBuf,
    manifest: Manifest,
    dataset: MemoryDataset,
}

impl ContainerReader {
    /// Open a container file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mimetype = read_entry_string(&mut archive, "mimetype")?;
        if mimetype.trim() != NCZ_MIMETYPE {
            return Err(StoreError::InvalidFormat(format!(
                "unexpected mimetype '{}' in {}",
                mimetype.trim(),
                path.display()
            )));
        }

        let manifest: Manifest =
            serde_json::from_str(&read_entry_string(&mut archive, "manifest.json")?)?;
        if !manifest.is_supported() {
            return Err(StoreError::InvalidFormat(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }
        log::debug!(
            "Opened {} (format {}, written by {})",
            path.display(),
            manifest.format_version,
            manifest.generator
        );

        let mut dataset = MemoryDataset::new();
        restore_scope(&mut archive, &manifest.root, &mut dataset)?;
        for group in &manifest.root.groups {
            let mut scope = MemoryDataset::named(&group.name);
            restore_scope(&mut archive, group, &mut scope)?;
            dataset.restore_group(scope)?;
        }

        Ok(Self {
            path,
            manifest,
            dataset,
        })
    }

    /// Path the container was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed manifest
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// The loaded dataset
    pub fn dataset(&self) -> &MemoryDataset {
        &self.dataset
    }

    /// Take ownership of the loaded dataset
    pub fn into_dataset(self) -> MemoryDataset {
        self.dataset
    }
}

fn read_entry_bytes(archive: &mut Archive, name: &str) -> Result<Vec<u8>, StoreError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|_| StoreError::InvalidFormat(format!("ZIP container missing {name}")))?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

fn read_entry_string(archive: &mut Archive, name: &str) -> Result<String, StoreError> {
    String::from_utf8(read_entry_bytes(archive, name)?)
        .map_err(|e| StoreError::InvalidFormat(format!("{name} is not UTF-8: {e}")))
}

fn restore_scope(
    archive: &mut Archive,
    scope: &ScopeManifest,
    dataset: &mut MemoryDataset,
) -> Result<(), StoreError> {
    for attr in &scope.attributes {
        dataset.set_attribute(&attr.name, attr.value.clone())?;
    }
    for dim in &scope.dimensions {
        dataset.restore_dimension(dim.clone());
    }
    for var in &scope.variables {
        let data = match &var.data {
            Some(entry) => Some(read_values(archive, entry, var.dtype, &var.shape)?),
            None => None,
        };
        let def = VariableDef {
            name: var.name.clone(),
            dtype: var.dtype,
            dimensions: var.dimensions.clone(),
            storage: var.storage.clone(),
        };
        dataset.restore_variable(def, var.attributes.clone(), data);
    }
    Ok(())
}

fn read_values(
    archive: &mut Archive,
    entry: &str,
    dtype: DataType,
    shape: &[usize],
) -> Result<TypedArray, StoreError> {
    // Bytes implements ChunkReader
    let bytes = Bytes::from(read_entry_bytes(archive, entry)?);
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;

    let stored_shape = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .and_then(|kv| kv.iter().find(|k| k.key == SHAPE_METADATA_KEY))
        .and_then(|k| k.value.clone());
    if let Some(stored_shape) = stored_shape {
        if stored_shape != format_shape(shape) {
            return Err(StoreError::InvalidFormat(format!(
                "{entry} has shape [{stored_shape}], manifest says {shape:?}"
            )));
        }
    }

    let reader = builder.build()?;
    let mut columns = Vec::new();
    for batch in reader {
        columns.push(batch?.column(0).clone());
    }
    let values = match columns.len() {
        0 => TypedValues::filled(dtype, 0.0, 0),
        1 => TypedValues::from_arrow(dtype, columns[0].as_ref())?,
        _ => {
            let refs: Vec<&dyn arrow::array::Array> = columns.iter().map(|c| c.as_ref()).collect();
            let merged = arrow::compute::concat(&refs)?;
            TypedValues::from_arrow(dtype, merged.as_ref())?
        }
    };
    TypedArray::new(shape.to_vec(), values)
}

impl ArraySource for ContainerReader {
    fn attributes(&self) -> AttributeSet {
        self.dataset.attributes()
    }

    fn dimensions(&self) -> Vec<DimensionInfo> {
        self.dataset.dimensions()
    }

    fn variables(&self) -> Vec<VariableInfo> {
        self.dataset.variables()
    }

    fn group_names(&self) -> Vec<String> {
        self.dataset.group_names()
    }

    fn group(&self, name: &str) -> Option<&dyn ArraySource> {
        self.dataset.group(name)
    }

    fn read(&self, variable: &str) -> Result<TypedArray, StoreError> {
        self.dataset.read(variable)
    }
}
