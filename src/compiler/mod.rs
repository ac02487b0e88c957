//! # Schema-to-Target Compiler
//!
//! Walks a [`ValidSchema`] and issues creation calls against an
//! [`ArrayTarget`], binding data from a [`DataBindings`].
//!
//! Order of operations:
//!
//! 1. global attributes (with optional provenance stamp)
//! 2. root dimensions, each with its coordinate variable
//! 3. root variables, with data
//! 4. each group: its attributes, then steps 2 and 3 inside the group
//!
//! Dimension names resolve in the scope being compiled only. A fixed
//! dimension must match the extent of every array written along it; an
//! unlimited one grows to the largest extent.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ncgen::compiler::{compile, CompileOptions};
//! use ncgen::data::{DataBindings, NdArray};
//! use ncgen::schema::Schema;
//! use ncgen::store::MemoryDataset;
//!
//! let schema = Schema::from_path("pwat.toml")?.validate()?;
//! let data = DataBindings::new()
//!     .with("pwat", NdArray::new(vec![3, 10, 20], vec![0.0; 600])?);
//! let mut target = MemoryDataset::new();
//! let summary = compile(&schema, &data, &CompileOptions::default(), &mut target)?;
//! println!("{summary}");
//! ```

mod error;
mod provenance;
mod transform;

use std::fmt;

use chrono::Utc;
use log::{debug, info};

use crate::data::{DataBindings, NdArray};
use crate::schema::{
    qualified, AttributeSet, Cardinality, DataType, DimensionSpec, ValidSchema, VariableSpec,
    ROOT_SCOPE,
};
use crate::store::{ArrayTarget, StoreError, VariableDef};

pub use error::CompileError;

use transform::{coerce_attribute, Encoding};

/// Switches for one compile run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Write `history`, `date_created` and `date_modified`
    pub stamp_provenance: bool,
    /// Allow variables over an unlimited dimension to be created without data,
    /// to be filled later with [`append`]
    pub defer_unlimited: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            stamp_provenance: true,
            defer_unlimited: false,
        }
    }
}

/// What a compile run created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    /// Dimensions created, groups included
    pub dimensions: usize,
    /// Variables created, coordinate variables included
    pub variables: usize,
    /// Stored values written
    pub values_written: usize,
    /// Groups created
    pub groups: usize,
    /// Variables left empty for later appends (group-qualified)
    pub deferred: Vec<String>,
}

impl fmt::Display for CompileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dimensions, {} variables ({} values), {} groups",
            self.dimensions, self.variables, self.values_written, self.groups
        )?;
        if !self.deferred.is_empty() {
            write!(f, ", deferred: {}", self.deferred.join(", "))?;
        }
        Ok(())
    }
}

/// Materialize `schema` with `data` into `target`.
///
/// Every failure is fatal; whatever was created before it stays in the
/// target, which owns its own cleanup.
pub fn compile(
    schema: &ValidSchema,
    data: &DataBindings,
    options: &CompileOptions,
    target: &mut dyn ArrayTarget,
) -> Result<CompileSummary, CompileError> {
    info!(
        "Compiling schema: {} dimensions, {} variables, {} groups",
        schema.dimensions.len(),
        schema.variables.len(),
        schema.groups.len()
    );

    let stamp = options.stamp_provenance.then(Utc::now);
    let globals =
        provenance::global_attributes(&schema.global_attributes, data.global_attributes(), stamp);
    for attr in &globals {
        target.set_attribute(&attr.name, attr.value.clone())?;
    }

    let mut summary = CompileSummary::default();
    ScopeCompiler {
        scope: ROOT_SCOPE,
        data,
        options,
    }
    .run(&schema.dimensions, &schema.variables, target, &mut summary)?;

    let no_data = DataBindings::new();
    for group in &schema.groups {
        info!("Compiling group '{}'", group.name);
        let group_target = target.create_group(&group.name)?;
        for attr in &group.attributes {
            group_target.set_attribute(&attr.name, attr.value.clone())?;
        }
        ScopeCompiler {
            scope: &group.name,
            data: data.group(&group.name).unwrap_or(&no_data),
            options,
        }
        .run(&group.dimensions, &group.variables, group_target, &mut summary)?;
        summary.groups += 1;
    }

    info!("Compiled {summary}");
    Ok(summary)
}

/// Write one record of `variable` at `index` along its leading unlimited
/// dimension.
///
/// `variable` is a root variable name or `group/name`. Coordinate variables
/// of dimensions can be appended to by the dimension name. The record has
/// the variable's rank minus one and goes through the same packing and
/// conversion as compiled data.
pub fn append(
    schema: &ValidSchema,
    target: &mut dyn ArrayTarget,
    variable: &str,
    index: usize,
    record: &NdArray,
) -> Result<(), CompileError> {
    let (group, name) = match variable.split_once('/') {
        Some((group, name)) => (Some(group), name),
        None => (None, variable),
    };
    let (dimensions, variables) = match group {
        None => (&schema.dimensions, &schema.variables),
        Some(g) => {
            let spec = schema
                .group(g)
                .ok_or_else(|| StoreError::not_found("Group", g))?;
            (&spec.dimensions, &spec.variables)
        }
    };

    let (dtype, dims, encoding_storage, packing) =
        if let Some(var) = variables.iter().find(|v| v.name == name) {
            (var.dtype, var.dimensions.clone(), &var.storage, var.packing.as_ref())
        } else if let Some(dim) = dimensions
            .iter()
            .find(|d| d.name == name && d.create_variable)
        {
            (dim.dtype, vec![dim.name.clone()], &dim.storage, None)
        } else {
            return Err(StoreError::not_found("Variable", variable).into());
        };
    let dtype = dtype.ok_or_else(|| CompileError::data(variable, "variable has no type"))?;

    let target = scope_target(target, group)?;
    let encoding = Encoding {
        dtype,
        storage: encoding_storage,
        packing,
    };
    let typed = encoding.encode(variable, record)?;
    if dims.is_empty() {
        return Err(CompileError::data(variable, "scalar variables have no records"));
    }

    let mut extents = vec![index + 1];
    extents.extend_from_slice(typed.shape());
    check_extents(&*target, variable, &dims, &extents)?;

    debug!("Appending record {index} of '{variable}' ({} values)", typed.len());
    target.write_record(name, index, typed)?;
    Ok(())
}

fn scope_target<'t>(
    target: &'t mut dyn ArrayTarget,
    group: Option<&str>,
) -> Result<&'t mut dyn ArrayTarget, CompileError> {
    match group {
        None => Ok(target),
        Some(g) => target
            .group_mut(g)
            .ok_or_else(|| StoreError::not_found("Group", g).into()),
    }
}

/// Rank and fixed-length checks of data about to be written
fn check_extents(
    target: &dyn ArrayTarget,
    variable: &str,
    dimensions: &[String],
    extents: &[usize],
) -> Result<(), CompileError> {
    if extents.len() != dimensions.len() {
        return Err(CompileError::VariableRankMismatch {
            variable: variable.to_string(),
            expected: dimensions.len(),
            found: extents.len(),
        });
    }
    for (dim, &extent) in dimensions.iter().zip(extents) {
        let info = target
            .dimension(dim)
            .ok_or_else(|| StoreError::not_found("Dimension", dim))?;
        if !info.unlimited && info.length != extent {
            return Err(CompileError::DimensionLengthMismatch {
                dimension: dim.clone(),
                variable: variable.to_string(),
                expected: info.length,
                found: extent,
            });
        }
    }
    Ok(())
}

/// Compiles the dimensions and variables of one scope
struct ScopeCompiler<'a> {
    scope: &'a str,
    data: &'a DataBindings,
    options: &'a CompileOptions,
}

impl ScopeCompiler<'_> {
    fn run(
        &self,
        dimensions: &[DimensionSpec],
        variables: &[VariableSpec],
        target: &mut dyn ArrayTarget,
        summary: &mut CompileSummary,
    ) -> Result<(), CompileError> {
        for dim in dimensions {
            self.dimension(dim, target, summary)?;
        }
        for var in variables {
            self.variable(var, target, summary)?;
        }
        Ok(())
    }

    fn dimension(
        &self,
        dim: &DimensionSpec,
        target: &mut dyn ArrayTarget,
        summary: &mut CompileSummary,
    ) -> Result<(), CompileError> {
        let binding = match &dim.cardinality {
            Cardinality::FromData(key) => {
                Some(self.data.get(key).ok_or_else(|| CompileError::MissingData {
                    kind: "dimension",
                    name: qualified(self.scope, key),
                })?)
            }
            _ => None,
        };
        let length = match &dim.cardinality {
            Cardinality::Fixed(n) => Some(*n),
            Cardinality::Unlimited => None,
            Cardinality::FromData(_) => binding.map(|b| b.as_size().unwrap_or_else(|| b.len())),
        };

        debug!(
            "Dimension '{}': {}",
            qualified(self.scope, &dim.name),
            length.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
        );
        target.create_dimension(&dim.name, length)?;
        summary.dimensions += 1;

        let dtype = match dim.dtype {
            Some(dtype) if dim.create_variable => dtype,
            _ => return Ok(()),
        };
        target.create_variable(VariableDef {
            name: dim.name.clone(),
            dtype,
            dimensions: vec![dim.name.clone()],
            storage: dim.storage.clone(),
        })?;
        self.attach_attributes(target, &dim.name, &dim.attributes, dtype)?;
        summary.variables += 1;

        // An integer scalar binding is only a size; arrays are coordinate values.
        if let Some(array) = binding.filter(|b| b.as_size().is_none()) {
            let flat = array
                .clone()
                .reshape(vec![array.len()])
                .map_err(|e| CompileError::data(&dim.name, e.to_string()))?;
            let encoding = Encoding {
                dtype,
                storage: &dim.storage,
                packing: None,
            };
            self.write(target, &dim.name, &[dim.name.clone()], encoding, &flat, summary)?;
        }
        Ok(())
    }

    fn variable(
        &self,
        var: &VariableSpec,
        target: &mut dyn ArrayTarget,
        summary: &mut CompileSummary,
    ) -> Result<(), CompileError> {
        let name = qualified(self.scope, &var.name);
        let dtype = var.dtype.ok_or_else(|| {
            CompileError::data(&name, format!("unsupported type '{}'", var.dtype_name))
        })?;
        let binding = self.data.get(&var.name);

        let mut dimensions = var.dimensions.clone();
        if dimensions.is_empty() && dtype == DataType::Char {
            if let Some(texts) = binding.and_then(|b| b.values().as_text()) {
                let width = texts.iter().map(|s| s.len()).max().unwrap_or(0);
                let strdim = format!("strdim{width:02}");
                if target.dimension(&strdim).is_none() {
                    target.create_dimension(&strdim, Some(width))?;
                    summary.dimensions += 1;
                }
                dimensions.push(strdim);
            }
        }

        debug!("Variable '{name}': {dtype} {dimensions:?}");
        target.create_variable(VariableDef {
            name: var.name.clone(),
            dtype,
            dimensions: dimensions.clone(),
            storage: var.storage.clone(),
        })?;
        self.attach_attributes(target, &var.name, &var.attributes, dtype)?;
        summary.variables += 1;

        let encoding = Encoding {
            dtype,
            storage: &var.storage,
            packing: var.packing.as_ref(),
        };
        match binding {
            Some(array) if dimensions.is_empty() && array.len() == 1 && !array.is_scalar() => {
                let scalar = array
                    .clone()
                    .reshape(Vec::new())
                    .map_err(|e| CompileError::data(&name, e.to_string()))?;
                self.write(target, &var.name, &dimensions, encoding, &scalar, summary)
            }
            Some(array) => self.write(target, &var.name, &dimensions, encoding, array, summary),
            None if self.options.defer_unlimited && spans_unlimited(&*target, &dimensions) => {
                debug!("Variable '{name}' deferred for appends");
                summary.deferred.push(name);
                Ok(())
            }
            None => Err(CompileError::MissingData {
                kind: "variable",
                name,
            }),
        }
    }

    fn attach_attributes(
        &self,
        target: &mut dyn ArrayTarget,
        variable: &str,
        attributes: &AttributeSet,
        dtype: DataType,
    ) -> Result<(), CompileError> {
        for attr in attributes {
            let value = coerce_attribute(&attr.name, &attr.value, Some(dtype));
            target.set_variable_attribute(variable, &attr.name, value)?;
        }
        Ok(())
    }

    fn write(
        &self,
        target: &mut dyn ArrayTarget,
        variable: &str,
        dimensions: &[String],
        encoding: Encoding<'_>,
        array: &NdArray,
        summary: &mut CompileSummary,
    ) -> Result<(), CompileError> {
        let name = qualified(self.scope, variable);
        let typed = encoding.encode(&name, array)?;
        check_extents(&*target, &name, dimensions, typed.shape())?;
        summary.values_written += typed.len();
        target.write(variable, typed)?;
        Ok(())
    }
}

fn spans_unlimited(target: &dyn ArrayTarget, dimensions: &[String]) -> bool {
    dimensions
        .iter()
        .any(|d| target.dimension(d).is_some_and(|info| info.unlimited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DimensionSpec, GroupSpec, PackingSpec, Schema};
    use crate::store::{ArraySource, MemoryDataset, TypedValues};

    fn scenario_a() -> ValidSchema {
        let mut schema = Schema::new();
        schema.global_attributes.insert("title", "Precipitable water");
        schema.dimensions = vec![
            DimensionSpec::unlimited("time").with_dtype(DataType::Int32),
            DimensionSpec::fixed("latitude", 10).with_dtype(DataType::Float32),
            DimensionSpec::fixed("longitude", 20).with_dtype(DataType::Float32),
        ];
        schema.variables = vec![VariableSpec::new(
            "pwat",
            DataType::Float64,
            ["time", "latitude", "longitude"],
        )
        .with_attribute("units", "kg m-2")];
        schema.validate().unwrap()
    }

    fn pwat(time: usize) -> NdArray {
        NdArray::new(vec![time, 10, 20], vec![1.5; time * 200]).unwrap()
    }

    #[test]
    fn test_scenario_a_unlimited_time() {
        let schema = scenario_a();
        let data = DataBindings::new().with("pwat", pwat(3));
        let mut target = MemoryDataset::new();
        let summary = compile(&schema, &data, &CompileOptions::default(), &mut target).unwrap();

        let time = target.dimension("time").unwrap();
        assert_eq!(time.length, 3);
        assert!(time.unlimited);
        assert_eq!(summary.dimensions, 3);
        assert_eq!(summary.variables, 4);
        assert_eq!(summary.values_written, 600);
        assert!(target.attributes().contains("history"));
        assert!(target.attributes().contains("date_created"));
    }

    #[test]
    fn test_fixed_length_mismatch() {
        let schema = scenario_a();
        let data = DataBindings::new()
            .with("pwat", NdArray::new(vec![1, 9, 20], vec![0.0; 180]).unwrap());
        let err = compile(&schema, &data, &CompileOptions::default(), &mut MemoryDataset::new())
            .unwrap_err();
        match err {
            CompileError::DimensionLengthMismatch {
                dimension,
                expected,
                found,
                ..
            } => {
                assert_eq!(dimension, "latitude");
                assert_eq!((expected, found), (10, 9));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rank_mismatch_and_missing_data() {
        let schema = scenario_a();
        let data = DataBindings::new().with("pwat", NdArray::from_vec(vec![1.0, 2.0]));
        let err = compile(&schema, &data, &CompileOptions::default(), &mut MemoryDataset::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::VariableRankMismatch {
                expected: 3,
                found: 1,
                ..
            }
        ));

        let err = compile(
            &schema,
            &DataBindings::new(),
            &CompileOptions::default(),
            &mut MemoryDataset::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::MissingData { kind: "variable", .. }));
    }

    #[test]
    fn test_deferred_then_append() {
        let schema = scenario_a();
        let options = CompileOptions {
            stamp_provenance: false,
            defer_unlimited: true,
        };
        let mut target = MemoryDataset::new();
        let summary = compile(&schema, &DataBindings::new(), &options, &mut target).unwrap();
        assert_eq!(summary.deferred, vec!["pwat"]);
        assert_eq!(target.dimension("time").unwrap().length, 0);
        assert!(!target.attributes().contains("history"));

        let record = NdArray::new(vec![10, 20], vec![2.0; 200]).unwrap();
        append(&schema, &mut target, "pwat", 0, &record).unwrap();
        append(&schema, &mut target, "pwat", 1, &record).unwrap();
        append(&schema, &mut target, "time", 1, &NdArray::scalar_int(6)).unwrap();
        assert_eq!(target.dimension("time").unwrap().length, 2);
        assert_eq!(
            target.read("time").unwrap().values(),
            &TypedValues::Int32(vec![-2147483647, 6])
        );

        let bad = NdArray::new(vec![10, 21], vec![2.0; 210]).unwrap();
        assert!(matches!(
            append(&schema, &mut target, "pwat", 2, &bad),
            Err(CompileError::DimensionLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_data_bound_dimension() {
        let mut schema = Schema::new();
        schema.dimensions = vec![
            DimensionSpec::from_data("lat", "lats").with_attribute("units", "degrees_north"),
            DimensionSpec::from_data("n", "count"),
        ];
        let schema = schema.validate().unwrap();
        let data = DataBindings::new()
            .with("lats", NdArray::from_vec(vec![10.0, 20.0, 30.0]))
            .with("count", NdArray::scalar_int(4));
        let mut target = MemoryDataset::new();
        compile(&schema, &data, &CompileOptions::default(), &mut target).unwrap();

        assert_eq!(target.dimension("lat").unwrap().length, 3);
        assert_eq!(target.dimension("n").unwrap().length, 4);
        assert_eq!(
            target.read("lat").unwrap().values(),
            &TypedValues::Float64(vec![10.0, 20.0, 30.0])
        );

        let err = compile(
            &schema,
            &DataBindings::new(),
            &CompileOptions::default(),
            &mut MemoryDataset::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::MissingData { kind: "dimension", .. }));
    }

    #[test]
    fn test_packed_variable_and_attribute_coercion() {
        let mut schema = Schema::new();
        schema.dimensions = vec![DimensionSpec::fixed("x", 2).with_dtype(DataType::Int32)];
        schema.variables = vec![VariableSpec::new("pwat", DataType::Int8, ["x"])
            .with_packing(PackingSpec::new(0.586, 37.5))
            .with_attribute("valid_max", 100.7)];
        let schema = schema.validate().unwrap();
        let data = DataBindings::new().with("pwat", NdArray::from_vec(vec![50.0, 37.5]));
        let mut target = MemoryDataset::new();
        compile(&schema, &data, &CompileOptions::default(), &mut target).unwrap();

        assert_eq!(
            target.read("pwat").unwrap().values(),
            &TypedValues::Int8(vec![21, 0])
        );
        let attrs = &target.variables()[1].attributes;
        assert_eq!(attrs.get("scale_factor").and_then(|v| v.as_f64()), Some(0.586));
        assert_eq!(attrs.get("valid_max").and_then(|v| v.as_f64()), Some(100.0));
    }

    #[test]
    fn test_char_variable_gets_string_dimension() {
        let mut schema = Schema::new();
        let mut label = VariableSpec::new("label", DataType::Char, Vec::<String>::new());
        label.attributes.insert("long_name", "station label");
        schema.variables = vec![label];
        let schema = schema.validate().unwrap();
        let data = DataBindings::new().with("label", NdArray::text("KSEA"));
        let mut target = MemoryDataset::new();
        compile(&schema, &data, &CompileOptions::default(), &mut target).unwrap();

        assert_eq!(target.dimension("strdim04").unwrap().length, 4);
        assert_eq!(
            target.read("label").unwrap().values().to_text(),
            Some(vec!["KSEA".to_string()])
        );
    }

    #[test]
    fn test_scenario_c_group_only() {
        let mut group = GroupSpec::new("blah");
        group.attributes.insert("comment", "group scope");
        group.dimensions = vec![
            DimensionSpec::unlimited("time").with_dtype(DataType::Int32),
            DimensionSpec::fixed("latitude", 10).with_dtype(DataType::Float32),
            DimensionSpec::fixed("longitude", 20).with_dtype(DataType::Float32),
        ];
        group.variables = vec![VariableSpec::new(
            "pwat",
            DataType::Float64,
            ["time", "latitude", "longitude"],
        )];
        let mut schema = Schema::new();
        schema.groups.push(group);
        let schema = schema.validate().unwrap();

        let data = DataBindings::new().with_group("blah", DataBindings::new().with("pwat", pwat(2)));
        let mut target = MemoryDataset::new();
        let summary = compile(&schema, &data, &CompileOptions::default(), &mut target).unwrap();

        assert_eq!(summary.groups, 1);
        assert!(target.dimensions().is_empty());
        assert!(target.variables().is_empty());
        let blah = target.group("blah").unwrap();
        assert_eq!(blah.dimensions().len(), 3);
        assert_eq!(blah.variables().len(), 4);
        assert!(blah.attributes().contains("comment"));

        let record = NdArray::new(vec![10, 20], vec![0.5; 200]).unwrap();
        append(&schema, &mut target, "blah/pwat", 2, &record).unwrap();
        assert_eq!(
            target.group("blah").unwrap().dimensions()[0].length,
            3
        );
    }
}
