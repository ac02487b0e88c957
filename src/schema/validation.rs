use std::collections::HashSet;

use super::error::SchemaError;
use super::types::{DimensionSpec, Schema, VariableSpec};

/// Scope label used for the root in error messages
pub(crate) const ROOT_SCOPE: &str = "/";

/// Checks that a loaded schema can be compiled.
///
/// Every scope is checked independently: a group sees only its own
/// dimensions, never the root's.
pub fn validate_schema(schema: &Schema) -> Result<(), SchemaError> {
    validate_scope(ROOT_SCOPE, &schema.dimensions, &schema.variables)?;

    let mut seen = HashSet::new();
    for group in &schema.groups {
        if !seen.insert(group.name.as_str()) {
            return Err(SchemaError::DuplicateName {
                scope: ROOT_SCOPE.to_string(),
                name: group.name.clone(),
            });
        }
        validate_scope(&group.name, &group.dimensions, &group.variables)?;
    }

    Ok(())
}

fn validate_scope(
    scope: &str,
    dimensions: &[DimensionSpec],
    variables: &[VariableSpec],
) -> Result<(), SchemaError> {
    let duplicate = |name: &str| SchemaError::DuplicateName {
        scope: scope.to_string(),
        name: name.to_string(),
    };

    let mut dim_names = HashSet::new();
    // Coordinate variables share the variable namespace.
    let mut var_names = HashSet::new();
    for dim in dimensions {
        if !dim_names.insert(dim.name.as_str()) {
            return Err(duplicate(&dim.name));
        }
        if dim.create_variable {
            if dim.dtype.is_none() {
                return Err(SchemaError::UnsupportedType {
                    name: qualified(scope, &dim.name),
                    dtype: dim.dtype_name.clone().unwrap_or_default(),
                });
            }
            var_names.insert(dim.name.as_str());
        }
    }

    for var in variables {
        if !var_names.insert(var.name.as_str()) {
            return Err(duplicate(&var.name));
        }
        let Some(dtype) = var.dtype else {
            return Err(SchemaError::UnsupportedType {
                name: qualified(scope, &var.name),
                dtype: var.dtype_name.clone(),
            });
        };
        if let Some(missing) = var.dimensions.iter().find(|d| !dim_names.contains(d.as_str())) {
            return Err(SchemaError::UnknownDimension {
                variable: qualified(scope, &var.name),
                dimension: missing.clone(),
            });
        }

        if let Some(packing) = &var.packing {
            let invalid = |reason: &str| SchemaError::InvalidPacking {
                variable: qualified(scope, &var.name),
                reason: reason.to_string(),
            };
            if !dtype.is_integer() {
                return Err(invalid("packed data must use an integer type"));
            }
            if packing.scale_factor == 0.0 || !packing.scale_factor.is_finite() {
                return Err(invalid("scale_factor must be finite and non-zero"));
            }
            if !packing.add_offset.is_finite() {
                return Err(invalid("add_offset must be finite"));
            }
            if let Some([lo, hi]) = packing.range {
                if lo > hi {
                    return Err(invalid("range minimum exceeds maximum"));
                }
            }
        }
    }

    Ok(())
}

/// `group/name` inside groups, the bare name at the root
pub(crate) fn qualified(scope: &str, name: &str) -> String {
    if scope == ROOT_SCOPE {
        name.to_string()
    } else {
        format!("{scope}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, GroupSpec, PackingSpec};

    fn base() -> Schema {
        Schema {
            dimensions: vec![DimensionSpec::unlimited("time"), DimensionSpec::fixed("lat", 2)],
            variables: vec![VariableSpec::new("pwat", DataType::Float32, ["time", "lat"])],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_schema() {
        assert!(validate_schema(&base()).is_ok());
    }

    #[test]
    fn test_unknown_dimension() {
        let mut schema = base();
        schema.variables[0].dimensions.push("lon".into());
        let err = validate_schema(&schema).unwrap_err();
        assert_eq!(
            err.to_string(),
            "One of the dimensions for pwat does not exist: 'lon'"
        );
    }

    #[test]
    fn test_group_does_not_see_root_dimensions() {
        let mut schema = base();
        let mut group = GroupSpec::new("blah");
        group.variables.push(VariableSpec::new("x", DataType::Int32, ["time"]));
        schema.groups.push(group);
        let err = validate_schema(&schema).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownDimension { ref variable, ref dimension }
                if variable == "blah/x" && dimension == "time"
        ));
    }

    #[test]
    fn test_unsupported_type() {
        let mut schema = base();
        schema.variables[0].dtype = None;
        schema.variables[0].dtype_name = "complex128".into();
        let err = validate_schema(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { ref dtype, .. } if dtype == "complex128"));
    }

    #[test]
    fn test_variable_clashes_with_coordinate() {
        let mut schema = base();
        schema
            .variables
            .push(VariableSpec::new("time", DataType::Float64, ["time"]));
        assert!(matches!(
            validate_schema(&schema),
            Err(SchemaError::DuplicateName { .. })
        ));

        // Without a coordinate variable the name is free.
        schema.dimensions[0].create_variable = false;
        assert!(validate_schema(&schema).is_ok());
    }

    #[test]
    fn test_invalid_packing() {
        let mut schema = base();
        schema.variables[0].packing = Some(PackingSpec::new(0.5, 1.0));
        assert!(matches!(
            validate_schema(&schema),
            Err(SchemaError::InvalidPacking { ref reason, .. }) if reason.contains("integer")
        ));

        schema.variables[0].dtype = Some(DataType::Int8);
        assert!(validate_schema(&schema).is_ok());
        schema.variables[0].packing = Some(PackingSpec::new(0.0, 1.0));
        assert!(matches!(
            validate_schema(&schema),
            Err(SchemaError::InvalidPacking { .. })
        ));
    }

    #[test]
    fn test_duplicate_group() {
        let mut schema = base();
        schema.groups.push(GroupSpec::new("g"));
        schema.groups.push(GroupSpec::new("g"));
        assert!(matches!(
            validate_schema(&schema),
            Err(SchemaError::DuplicateName { ref name, .. }) if name == "g"
        ));
    }
}
