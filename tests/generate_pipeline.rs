//! End-to-end tests: configuration file + data document -> container file
//!
//! Uses the bundled demo configurations under `demos/` plus small inline
//! documents for the failure cases.

use ncgen::compiler::{append, CompileError, CompileOptions};
use ncgen::data::{DataBindings, NdArray};
use ncgen::dump::{describe, dump};
use ncgen::generate::{generate, generate_open, NcgenError};
use ncgen::schema::{Schema, SchemaError};
use ncgen::store::{ArraySource, ContainerConfig, ContainerReader, TypedValues};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn grid_data(times: usize) -> DataBindings {
    let lat: Vec<f64> = (0..50).map(|i| -90.0 + i as f64 * 180.0 / 49.0).collect();
    let lon: Vec<f64> = (0..50).map(|i| i as f64 * 359.0 / 49.0).collect();
    let field: Vec<f64> = (0..times * 2500).map(|i| (i % 76) as f64).collect();
    DataBindings::new()
        .with("time", (0..times as i64).map(|t| 123_456 + t).collect::<Vec<_>>())
        .with("lat", lat)
        .with("lon", lon)
        .with("pwat", NdArray::new(vec![times, 50, 50], field).unwrap())
}

#[test]
fn test_all_data_demo() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("all_data.ncz");
    let report = generate(
        demo("all_data.toml"),
        &grid_data(2),
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap();
    assert_eq!(report.summary.dimensions, 3);
    assert_eq!(report.summary.variables, 4);
    assert_eq!(report.stats.variables_written, 4);

    let reader = ContainerReader::open(&output).unwrap();
    let description = describe(&reader);
    assert_eq!(description.root.dimension("time").unwrap().length, 2);
    assert!(!description.root.dimension("time").unwrap().unlimited);
    assert_eq!(description.root.dimension("lat").unwrap().length, 50);

    let history = description
        .root
        .attributes
        .get("history")
        .and_then(|v| v.as_text())
        .unwrap();
    assert!(history.starts_with("Created "));
    assert!(history.ends_with("generated by the ncgen demo"));

    // _FillValue is coerced to the variable type.
    let pwat = description.root.variable("pwat").unwrap();
    assert_eq!(
        pwat.attributes.get("_FillValue").and_then(|v| v.as_f64()),
        Some(-9999.0)
    );
    assert_eq!(
        reader.read("time").unwrap().values(),
        &TypedValues::Int32(vec![123_456, 123_457])
    );
}

#[test]
fn test_time_unlimited_demo_with_appends() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("time_unlimited.ncz");
    let coordinates = {
        let full = grid_data(0);
        DataBindings::new()
            .with("lat", full.get("lat").unwrap().clone())
            .with("lon", full.get("lon").unwrap().clone())
    };
    let options = CompileOptions {
        defer_unlimited: true,
        ..CompileOptions::default()
    };

    let (mut writer, schema, summary) = generate_open(
        demo("time_unlimited.toml"),
        &coordinates,
        &output,
        ContainerConfig::fast_write(),
        &options,
        false,
    )
    .unwrap();
    assert_eq!(summary.deferred, ["pwat"]);

    for step in 0..3 {
        let record = NdArray::new(vec![50, 50], vec![1.23456 + step as f64; 2500]).unwrap();
        append(&schema, &mut writer, "pwat", step, &record).unwrap();
        append(&schema, &mut writer, "time", step, &NdArray::scalar_int(step as i64)).unwrap();
    }
    writer.close().unwrap();

    let reader = ContainerReader::open(&output).unwrap();
    let time = &reader.dimensions()[0];
    assert_eq!(time.name, "time");
    assert!(time.unlimited);
    assert_eq!(time.length, 3);

    // least_significant_digit = 2 keeps the value within 10^-2.
    let pwat = reader.read("pwat").unwrap().values().to_f64().unwrap();
    assert_eq!(pwat.len(), 7500);
    assert!((pwat[0] - 1.23456).abs() < 0.01);
    assert!((pwat[7499] - 3.23456).abs() < 0.01);
}

#[test]
fn test_groups_demo() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("groups.ncz");
    let data = DataBindings::new().with_group("blah", grid_data(2));
    generate(
        demo("groups.toml"),
        &data,
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap();

    let reader = ContainerReader::open(&output).unwrap();
    let description = dump(&reader, "groups", false);
    assert!(description.root.dimensions.is_empty());
    assert!(description.root.variables.is_empty());
    assert_eq!(description.groups.len(), 1);
    let blah = description.group("blah").unwrap();
    assert_eq!(blah.variable("pwat").unwrap().shape, [2, 50, 50]);
    assert!(description.to_string().starts_with("netcdf groups {\n"));
}

#[test]
fn test_packed_demo() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("packed.ncz");
    let mut data = grid_data(1);
    data.insert(
        "pwat",
        NdArray::new(vec![1, 50, 50], {
            let mut v = vec![37.5; 2500];
            v[0] = 50.0;
            v[1] = 0.0;
            v[2] = 75.0;
            v
        })
        .unwrap(),
    );
    generate(
        demo("packed.toml"),
        &data,
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap();

    let reader = ContainerReader::open(&output).unwrap();
    // lon has no coordinate variable.
    let names: Vec<String> = reader.variables().into_iter().map(|v| v.name).collect();
    assert_eq!(names, ["time", "lat", "pwat"]);
    match reader.read("pwat").unwrap().values() {
        TypedValues::Int8(values) => {
            assert_eq!(&values[..3], &[21, -64, 64]);
            assert_eq!(values[3], 0);
        }
        other => panic!("unexpected storage type {:?}", other.dtype()),
    }
}

#[test]
fn test_json_config_and_data_documents() {
    let dir = tempdir().unwrap();
    let config = write(
        dir.path(),
        "station.json",
        r#"{
            "global_attributes": {"title": "station", "history": null},
            "dimensions": {
                "time": {"size": null, "dtype": "int64"},
                "station": {"size": 2, "dtype": "i4", "long_name": "station id"}
            },
            "variables": {
                "temp": {"dtype": "f4", "dim": ["time", "station"], "fill_value": -999.0, "units": "K"}
            }
        }"#,
    );
    let data = write(
        dir.path(),
        "station_data.json",
        r#"{
            "global_attributes": {"comment": "from data"},
            "station": [101, 102],
            "temp": [[280.5, null], [281.0, 282.5], [283.0, 284.0]]
        }"#,
    );
    let output = dir.path().join("station.ncz");
    let bindings = DataBindings::from_path(&data).unwrap();
    let err = generate(
        &config,
        &bindings,
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        NcgenError::Schema(SchemaError::ConfigShape { .. })
    ));

    // `history = null` is not an attribute value; drop it and retry.
    std::fs::write(
        &config,
        std::fs::read_to_string(&config)
            .unwrap()
            .replace(r#", "history": null"#, ""),
    )
    .unwrap();
    generate(
        &config,
        &bindings,
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap();

    let reader = ContainerReader::open(&output).unwrap();
    assert_eq!(reader.dimensions()[0].length, 3);
    assert_eq!(
        reader.attributes().get("comment").and_then(|v| v.as_text()),
        Some("from data")
    );
    let temp = reader.read("temp").unwrap().values().to_f64().unwrap();
    assert_eq!(temp[1], -999.0);
    assert_eq!(temp[2], 281.0);
}

#[test]
fn test_unknown_dimension_fails_before_output() {
    let dir = tempdir().unwrap();
    let config = write(
        dir.path(),
        "bad.toml",
        r#"
[global_attributes]
title = "bad"

[dimensions.x]
size = 3
dtype = "i4"

[variables.v]
dtype = "f4"
dim = ["x", "y"]
"#,
    );
    let output = dir.path().join("bad.ncz");
    let err = generate(
        &config,
        &DataBindings::new(),
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap_err();
    match err {
        NcgenError::Schema(SchemaError::UnknownDimension { variable, dimension }) => {
            assert_eq!(variable, "v");
            assert_eq!(dimension, "y");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_fixed_length_mismatch_removes_partial_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("mismatch.ncz");
    let config = write(
        dir.path(),
        "fixed.toml",
        r#"
[global_attributes]
title = "fixed"

[dimensions.lat]
size = 50
dtype = "f4"

[variables.field]
dtype = "f8"
dim = ["lat"]
"#,
    );
    let data = DataBindings::new().with("field", vec![1.0; 49]);
    let err = generate(
        &config,
        &data,
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        NcgenError::Compile(CompileError::DimensionLengthMismatch {
            expected: 50,
            found: 49,
            ..
        })
    ));
    assert!(!output.exists());
}

#[test]
fn test_clobber() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("clobber.ncz");
    std::fs::write(&output, b"not a container").unwrap();

    let err = generate(
        demo("all_data.toml"),
        &grid_data(1),
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, NcgenError::OutputExists(_)));
    assert_eq!(std::fs::read(&output).unwrap(), b"not a container");

    generate(
        demo("all_data.toml"),
        &grid_data(1),
        &output,
        ContainerConfig::default(),
        &CompileOptions::default(),
        true,
    )
    .unwrap();
    assert!(ContainerReader::open(&output).is_ok());
}

#[test]
fn test_unsupported_config_extension() {
    let dir = tempdir().unwrap();
    let config = write(dir.path(), "schema.yaml", "title: x\n");
    let err = Schema::from_path(&config).unwrap_err();
    assert!(matches!(err, SchemaError::Config(_)));
    assert!(err.to_string().contains("yaml"));
}
