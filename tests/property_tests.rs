//! Property-based tests for compile, packing and the StructMetadata parser

use ncgen::compiler::{compile, CompileOptions};
use ncgen::data::{DataBindings, NdArray};
use ncgen::dump::{describe, parse_struct_metadata, MetadataValue};
use ncgen::schema::{DataType, DimensionSpec, PackingSpec, Schema, VariableSpec};
use ncgen::store::{ArraySource, ArrayTarget, MemoryDataset};
use proptest::prelude::*;

fn unstamped() -> CompileOptions {
    CompileOptions {
        stamp_provenance: false,
        ..CompileOptions::default()
    }
}

proptest! {
    /// Unlimited dimensions grow to the extent written, fixed ones keep theirs
    #[test]
    fn test_unlimited_grows_to_extent(time in 1usize..8, x in 1usize..6, y in 1usize..6) {
        let mut schema = Schema::new();
        schema.dimensions = vec![
            DimensionSpec::unlimited("time").with_dtype(DataType::Int32),
            DimensionSpec::fixed("x", x).with_dtype(DataType::Float32),
            DimensionSpec::fixed("y", y).with_dtype(DataType::Float32),
        ];
        schema.variables = vec![VariableSpec::new("v", DataType::Float64, ["time", "x", "y"])];
        let schema = schema.validate().unwrap();

        let n = time * x * y;
        let data = DataBindings::new()
            .with("v", NdArray::new(vec![time, x, y], (0..n).map(|i| i as f64).collect::<Vec<_>>()).unwrap());
        let mut target = MemoryDataset::new();
        compile(&schema, &data, &unstamped(), &mut target).unwrap();

        prop_assert_eq!(target.dimension("time").unwrap().length, time);
        prop_assert_eq!(target.dimension("x").unwrap().length, x);
        let description = describe(&target);
        prop_assert_eq!(&description.root.variable("v").unwrap().shape, &vec![time, x, y]);
        prop_assert_eq!(description, describe(&target));
    }

    /// Packed values unpack to within half a quantum of the input
    #[test]
    fn test_packing_within_one_quantum(
        raw in prop::collection::vec(-100.0f64..100.0, 1..50),
        scale in 0.01f64..1.0,
    ) {
        let mut schema = Schema::new();
        schema.dimensions = vec![DimensionSpec::fixed("n", raw.len()).with_dtype(DataType::Int32)];
        schema.variables = vec![VariableSpec::new("v", DataType::Int16, ["n"])
            .with_packing(PackingSpec::new(scale, 0.0))];
        let schema = schema.validate().unwrap();

        let mut target = MemoryDataset::new();
        compile(&schema, &DataBindings::new().with("v", raw.clone()), &unstamped(), &mut target)
            .unwrap();

        let packed = target.read("v").unwrap().values().to_f64().unwrap();
        for (p, r) in packed.iter().zip(&raw) {
            let unpacked = PackingSpec::new(scale, 0.0).unpack(*p);
            prop_assert!((unpacked - r).abs() <= scale / 2.0 + 1e-9);
        }
    }

    /// Every KEY=number line inside a group comes back under its dotted path
    #[test]
    fn test_struct_metadata_numbers(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..10)) {
        let mut text = String::from("GROUP=GridStructure\n");
        for (i, v) in values.iter().enumerate() {
            text.push_str(&format!("\tField{i}={v}\n"));
        }
        text.push_str("END_GROUP=GridStructure\nEND\n");

        let tree = parse_struct_metadata(&text);
        for (i, v) in values.iter().enumerate() {
            let path = format!("GridStructure.Field{i}");
            prop_assert_eq!(tree.path(&path), Some(&MetadataValue::Number(*v)));
        }
        prop_assert_eq!(tree.flatten().len(), values.len());
    }
}
