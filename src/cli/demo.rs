use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use ncgen::compiler::{append, CompileOptions};
use ncgen::data::{DataBindings, NdArray};
use ncgen::generate::{generate, generate_open};
use ncgen::store::ContainerConfig;

use super::Profile;

const ALL_DATA: &str = include_str!("../../demos/all_data.toml");
const TIME_UNLIMITED: &str = include_str!("../../demos/time_unlimited.toml");
const GROUPS: &str = include_str!("../../demos/groups.toml");
const PACKED: &str = include_str!("../../demos/packed.toml");

const N_LAT: usize = 50;
const N_LON: usize = 50;
const TIMES: [i64; 2] = [123_456, 123_457];

/// Write the four demo files into `output`
pub fn run(output: PathBuf, profile: Profile) -> Result<()> {
    info!("ncgen demo");
    info!("==========");

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let container = profile.container_config(None);
    let options = CompileOptions::default();

    let config = write_config(&output, "all_data.toml", ALL_DATA)?;
    let target = output.join("all_data.ncz");
    generate(&config, &full_data()?, &target, container.clone(), &options, true)
        .context("Failed to write all_data demo")?;
    println!("Wrote {}", target.display());

    let config = write_config(&output, "time_unlimited.toml", TIME_UNLIMITED)?;
    let target = output.join("time_unlimited.ncz");
    write_time_unlimited(&config, &target, container.clone())?;
    println!("Wrote {}", target.display());

    let config = write_config(&output, "groups.toml", GROUPS)?;
    let target = output.join("groups.ncz");
    let data = DataBindings::new().with_group("blah", full_data()?);
    generate(&config, &data, &target, container.clone(), &options, true)
        .context("Failed to write groups demo")?;
    println!("Wrote {}", target.display());

    let config = write_config(&output, "packed.toml", PACKED)?;
    let target = output.join("packed.ncz");
    generate(&config, &full_data()?, &target, container, &options, true)
        .context("Failed to write packed demo")?;
    println!("Wrote {}", target.display());

    Ok(())
}

/// Create the file with coordinates only, then append one time step at a time
fn write_time_unlimited(config: &Path, target: &Path, container: ContainerConfig) -> Result<()> {
    let options = CompileOptions {
        defer_unlimited: true,
        ..CompileOptions::default()
    };
    let coordinates = DataBindings::new()
        .with("lat", latitudes())
        .with("lon", longitudes());
    let (mut writer, schema, summary) =
        generate_open(config, &coordinates, target, container, &options, true)
            .context("Failed to write time_unlimited demo")?;
    info!("Deferred for appends: {}", summary.deferred.join(", "));

    for (step, &time) in TIMES.iter().enumerate() {
        append(&schema, &mut writer, "time", step, &NdArray::scalar_int(time))?;
        let record = NdArray::new(vec![N_LAT, N_LON], field_at(step))?;
        append(&schema, &mut writer, "pwat", step, &record)?;
    }

    let stats = writer.close()?;
    info!("  {}", stats);
    Ok(())
}

fn write_config(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn full_data() -> Result<DataBindings> {
    let field: Vec<f64> = (0..TIMES.len()).flat_map(field_at).collect();
    let pwat = NdArray::new(vec![TIMES.len(), N_LAT, N_LON], field)?;
    Ok(DataBindings::new()
        .with("time", TIMES.to_vec())
        .with("lat", latitudes())
        .with("lon", longitudes())
        .with("pwat", pwat))
}

fn latitudes() -> Vec<f64> {
    linspace(-90.0, 90.0, N_LAT)
}

fn longitudes() -> Vec<f64> {
    linspace(0.0, 359.0, N_LON)
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let step = (stop - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Smooth synthetic field in [0, 75] for one time step
fn field_at(step: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(N_LAT * N_LON);
    for i in 0..N_LAT {
        for j in 0..N_LON {
            let phase = (i as f64 * 0.21 + j as f64 * 0.13 + step as f64).sin();
            values.push(37.5 + 37.5 * phase);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncgen::schema::Schema;

    #[test]
    fn test_bundled_configs_validate() {
        for content in [ALL_DATA, TIME_UNLIMITED, GROUPS, PACKED] {
            Schema::from_toml_str(content).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn test_synthetic_field_range() {
        let field = field_at(1);
        assert_eq!(field.len(), N_LAT * N_LON);
        assert!(field.iter().all(|v| (0.0..=75.0).contains(v)));
        assert_eq!(latitudes().first(), Some(&-90.0));
        let last = latitudes()[N_LAT - 1];
        assert!((last - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_demo_writes_four_files() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path().to_path_buf(), Profile::Fast).unwrap();
        for name in ["all_data", "time_unlimited", "groups", "packed"] {
            assert!(dir.path().join(format!("{name}.ncz")).exists());
        }
    }
}
