use anyhow::{Context, Result};
use std::path::PathBuf;

use ncgen::dump::dump;
use ncgen::store::ContainerReader;

/// Print the structure of a container file
pub fn run(file: PathBuf, verbose_dump: bool, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let reader = ContainerReader::open(&file)
        .with_context(|| format!("Failed to open container: {}", file.display()))?;
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let description = dump(&reader, &name, verbose_dump && !json);
    if json {
        let text = serde_json::to_string_pretty(&description)
            .context("Failed to serialize description")?;
        println!("{text}");
    } else if !verbose_dump {
        println!(
            "{}: {} dimensions, {} variables, {} groups",
            file.display(),
            description.root.dimensions.len(),
            description.root.variables.len(),
            description.groups.len()
        );
    }

    Ok(())
}
