//! End-to-end generation: configuration file plus data to a container file.

use std::path::Path;

use log::info;

use crate::compiler::{compile, CompileError, CompileOptions, CompileSummary};
use crate::data::{DataBindings, DataError};
use crate::schema::{Schema, SchemaError, ValidSchema};
use crate::store::{ContainerConfig, ContainerStats, ContainerWriter, StoreError};

/// Any failure along the generate pipeline
#[derive(Debug, thiserror::Error)]
pub enum NcgenError {
    /// Loading or validating the configuration failed
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The data document is malformed
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Compiling into the target failed
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// The container could not be created or finished
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The output exists and clobbering was not requested
    #[error("Output file already exists: {0} (use clobber to overwrite)")]
    OutputExists(String),
}

/// Result of a finished [`generate`] run
#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// What the compiler created
    pub summary: CompileSummary,
    /// What the container writer wrote
    pub stats: ContainerStats,
}

/// Compile the configuration at `config_path` with `data` into a new
/// container at `output` and close it.
pub fn generate(
    config_path: impl AsRef<Path>,
    data: &DataBindings,
    output: impl AsRef<Path>,
    container: ContainerConfig,
    options: &CompileOptions,
    clobber: bool,
) -> Result<GenerateReport, NcgenError> {
    let (writer, _, summary) =
        generate_open(config_path, data, output, container, options, clobber)?;
    let stats = writer.close()?;
    info!("Generated {}", stats);
    Ok(GenerateReport { summary, stats })
}

/// Like [`generate`] but leaves the writer open, so records can be appended
/// with [`crate::compiler::append`] before `close`.
pub fn generate_open(
    config_path: impl AsRef<Path>,
    data: &DataBindings,
    output: impl AsRef<Path>,
    container: ContainerConfig,
    options: &CompileOptions,
    clobber: bool,
) -> Result<(ContainerWriter, ValidSchema, CompileSummary), NcgenError> {
    let config_path = config_path.as_ref();
    let output = output.as_ref();

    info!("Loading configuration: {}", config_path.display());
    let schema = Schema::from_path(config_path)?.validate()?;

    prepare_output(output, clobber)?;

    let mut writer = ContainerWriter::with_config(output, container)?;
    // On error the writer is dropped here and removes its partial file.
    let summary = compile(&schema, data, options, &mut writer)?;
    Ok((writer, schema, summary))
}

fn prepare_output(output: &Path, clobber: bool) -> Result<(), NcgenError> {
    if !output.exists() {
        return Ok(());
    }
    if !clobber {
        return Err(NcgenError::OutputExists(output.display().to_string()));
    }
    info!("Removing existing file: {}", output.display());
    std::fs::remove_file(output).map_err(StoreError::from)?;
    Ok(())
}
