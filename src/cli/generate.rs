use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use ncgen::compiler::CompileOptions;
use ncgen::data::DataBindings;
use ncgen::generate::generate;

use super::config::Settings;
use super::Profile;

/// Arguments of the generate command
pub struct GenerateArgs {
    pub config: PathBuf,
    pub output: PathBuf,
    pub data: Option<PathBuf>,
    pub clobber: bool,
    pub profile: Option<Profile>,
    pub settings: Option<PathBuf>,
    pub no_provenance: bool,
    pub defer_unlimited: bool,
    pub compression_level: Option<i32>,
}

/// Compile a configuration into a container file
pub fn run(args: GenerateArgs) -> Result<()> {
    if !args.config.exists() {
        anyhow::bail!("Configuration file does not exist: {}", args.config.display());
    }

    let settings = match &args.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    let file = &settings.generate;

    let profile = match args.profile {
        Some(profile) => profile,
        None => file.profile()?.unwrap_or_default(),
    };
    let container = profile.container_config(args.compression_level.or(file.compression_level));
    let clobber = args.clobber || file.clobber.unwrap_or(false);
    let options = CompileOptions {
        stamp_provenance: !args.no_provenance && file.stamp_provenance.unwrap_or(true),
        defer_unlimited: args.defer_unlimited || file.defer_unlimited.unwrap_or(false),
    };

    let data = match &args.data {
        Some(path) => DataBindings::from_path(path)
            .with_context(|| format!("Failed to load data: {}", path.display()))?,
        None => DataBindings::new(),
    };

    info!("ncgen generate");
    info!("==============");
    info!("Config: {}", args.config.display());
    info!("Output: {}", args.output.display());
    info!("Profile: {}", profile);

    let report = generate(&args.config, &data, &args.output, container, &options, clobber)
        .context("Generation failed")?;

    info!("Generation complete!");
    info!("  {}", report.summary);
    info!("  {}", report.stats);
    println!("Wrote {}", args.output.display());

    Ok(())
}
