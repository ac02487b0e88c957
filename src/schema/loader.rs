//! Strict mapping from a [`ConfigTable`] into schema types.
//!
//! Every entry that does not fit the attribute/dimension/variable/group model
//! is rejected with [`SchemaError::ConfigShape`] naming its location.

use crate::config::{ConfigTable, ConfigValue};

use super::attributes::{AttributeSet, AttributeValue};
use super::constants::*;
use super::error::SchemaError;
use super::types::{
    Cardinality, DimensionSpec, GroupSpec, PackingSpec, Schema, StorageOptions, VariableSpec,
};

/// Build a schema from a configuration root.
///
/// `file_based` sources must carry a `global_attributes` section.
pub(crate) fn load_schema(root: &ConfigTable, file_based: bool) -> Result<Schema, SchemaError> {
    let global_attributes = match root.get(SECTION_GLOBAL_ATTRIBUTES) {
        Some(value) => {
            let table = expect_table(value, SECTION_GLOBAL_ATTRIBUTES)?;
            load_attributes(table, SECTION_GLOBAL_ATTRIBUTES, |_| false)?
        }
        None if file_based => {
            return Err(SchemaError::shape(
                SECTION_GLOBAL_ATTRIBUTES,
                "required section is missing",
            ))
        }
        None => AttributeSet::new(),
    };

    let groups = match root.get(SECTION_GROUPS) {
        Some(value) => {
            let table = expect_table(value, SECTION_GROUPS)?;
            table
                .iter()
                .map(|(name, entry)| load_group(name, entry))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => Vec::new(),
    };

    // A group-only document may omit the root sections entirely.
    let require_root = groups.is_empty();
    let (dimensions, variables) = load_scope(root, "", require_root)?;

    Ok(Schema {
        global_attributes,
        dimensions,
        variables,
        groups,
    })
}

fn expect_table<'a>(value: &'a ConfigValue, path: &str) -> Result<&'a ConfigTable, SchemaError> {
    value.as_table().ok_or_else(|| {
        SchemaError::shape(path, format!("expected a table, found {}", value.kind()))
    })
}

fn load_scope(
    table: &ConfigTable,
    prefix: &str,
    required: bool,
) -> Result<(Vec<DimensionSpec>, Vec<VariableSpec>), SchemaError> {
    let dims_path = format!("{prefix}{SECTION_DIMENSIONS}");
    let vars_path = format!("{prefix}{SECTION_VARIABLES}");

    let dimensions = match table.get(SECTION_DIMENSIONS) {
        Some(value) => expect_table(value, &dims_path)?
            .iter()
            .map(|(name, entry)| load_dimension(name, entry, &format!("{dims_path}.{name}")))
            .collect::<Result<Vec<_>, _>>()?,
        None if required => {
            return Err(SchemaError::shape(dims_path, "required section is missing"))
        }
        None => Vec::new(),
    };

    let variables = match table.get(SECTION_VARIABLES) {
        Some(value) => expect_table(value, &vars_path)?
            .iter()
            .map(|(name, entry)| load_variable(name, entry, &format!("{vars_path}.{name}")))
            .collect::<Result<Vec<_>, _>>()?,
        None if required => {
            return Err(SchemaError::shape(vars_path, "required section is missing"))
        }
        None => Vec::new(),
    };

    Ok((dimensions, variables))
}

fn load_group(name: &str, value: &ConfigValue) -> Result<GroupSpec, SchemaError> {
    let path = format!("{SECTION_GROUPS}.{name}");
    let table = expect_table(value, &path)?;

    let attributes = match table.get(SECTION_GROUP_ATTRIBUTES) {
        Some(value) => {
            let attr_path = format!("{path}.{SECTION_GROUP_ATTRIBUTES}");
            load_attributes(expect_table(value, &attr_path)?, &attr_path, |_| false)?
        }
        None => AttributeSet::new(),
    };
    let (dimensions, variables) = load_scope(table, &format!("{path}."), true)?;

    Ok(GroupSpec {
        name: name.to_string(),
        attributes,
        dimensions,
        variables,
    })
}

fn load_dimension(name: &str, value: &ConfigValue, path: &str) -> Result<DimensionSpec, SchemaError> {
    let table = expect_table(value, path)?;

    // `size` wins over `dat`; a null or zero size means unlimited.
    let cardinality = match (table.get(KEY_SIZE), table.get(KEY_DAT)) {
        (Some(size), _) if !size.is_null() => {
            let n = size.as_i64().ok_or_else(|| {
                SchemaError::shape(
                    format!("{path}.{KEY_SIZE}"),
                    format!("expected an integer, found {}", size.kind()),
                )
            })?;
            match n {
                n if n < 0 => {
                    return Err(SchemaError::shape(
                        format!("{path}.{KEY_SIZE}"),
                        format!("size must not be negative, found {n}"),
                    ))
                }
                0 => Cardinality::Unlimited,
                n => Cardinality::Fixed(n as usize),
            }
        }
        (_, Some(dat)) if !dat.is_null() => {
            let key = dat.as_str().ok_or_else(|| {
                SchemaError::shape(
                    format!("{path}.{KEY_DAT}"),
                    format!("expected the name of a data entry, found {}", dat.kind()),
                )
            })?;
            Cardinality::FromData(key.to_string())
        }
        _ => Cardinality::Unlimited,
    };

    let create_variable = match table.get(KEY_VAR) {
        Some(v) => v.as_bool().ok_or_else(|| {
            SchemaError::shape(format!("{path}.{KEY_VAR}"), "expected a boolean")
        })?,
        None => true,
    };

    let dtype_name = match table.get(KEY_DTYPE) {
        Some(v) => Some(
            v.as_str()
                .ok_or_else(|| SchemaError::shape(format!("{path}.{KEY_DTYPE}"), "expected a string"))?
                .to_string(),
        ),
        None if create_variable => {
            return Err(SchemaError::shape(
                path,
                "a dimension with a coordinate variable needs a dtype",
            ))
        }
        None => None,
    };

    let attributes = load_attributes(table, path, |key| {
        DIMENSION_RESERVED.contains(&key) || NC4_OPTIONS.contains(&key) || key == KEY_DIM
    })?;

    Ok(DimensionSpec {
        name: name.to_string(),
        attributes,
        dtype: dtype_name.as_deref().and_then(|s| s.parse().ok()),
        dtype_name,
        cardinality,
        create_variable,
        storage: load_storage(table, path)?,
    })
}

fn load_variable(name: &str, value: &ConfigValue, path: &str) -> Result<VariableSpec, SchemaError> {
    let table = expect_table(value, path)?;

    let dtype_name = table
        .get(KEY_DTYPE)
        .ok_or_else(|| SchemaError::shape(path, "missing required key 'dtype'"))?
        .as_str()
        .ok_or_else(|| SchemaError::shape(format!("{path}.{KEY_DTYPE}"), "expected a string"))?
        .to_string();

    let dimensions = match table.get(KEY_DIM) {
        None | Some(ConfigValue::Null) => Vec::new(),
        Some(ConfigValue::Text(single)) => vec![single.clone()],
        Some(ConfigValue::List(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    SchemaError::shape(
                        format!("{path}.{KEY_DIM}"),
                        format!("dimension names must be strings, found {}", item.kind()),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(SchemaError::shape(
                format!("{path}.{KEY_DIM}"),
                format!("expected a list of dimension names, found {}", other.kind()),
            ))
        }
    };

    let attributes = load_attributes(table, path, |key| {
        DIMENSION_RESERVED.contains(&key) || NC4_OPTIONS.contains(&key) || key == KEY_DIM
    })?;

    Ok(VariableSpec {
        name: name.to_string(),
        packing: load_packing(table, path)?,
        storage: load_storage(table, path)?,
        dtype: dtype_name.parse().ok(),
        dtype_name,
        dimensions,
        attributes,
    })
}

fn load_packing(table: &ConfigTable, path: &str) -> Result<Option<PackingSpec>, SchemaError> {
    let scale = optional_f64(table, ATTR_SCALE_FACTOR, path)?;
    let offset = optional_f64(table, ATTR_ADD_OFFSET, path)?;
    if scale.is_none() && offset.is_none() {
        return Ok(None);
    }

    let range_key = [ATTR_ACTUAL_RANGE, ATTR_VALID_RANGE]
        .into_iter()
        .find(|k| table.contains_key(k));
    let range = match range_key {
        Some(key) => {
            let key_path = format!("{path}.{key}");
            let value = table.get(key).map(|v| attribute_value(v, &key_path)).transpose()?;
            match value.and_then(|v| v.as_f64_list()) {
                Some(values) if values.len() == 2 => Some([values[0], values[1]]),
                _ => {
                    return Err(SchemaError::shape(
                        key_path,
                        "expected a [min, max] pair of numbers",
                    ))
                }
            }
        }
        None => None,
    };

    Ok(Some(PackingSpec {
        scale_factor: scale.unwrap_or(1.0),
        add_offset: offset.unwrap_or(0.0),
        range,
    }))
}

fn load_storage(table: &ConfigTable, path: &str) -> Result<StorageOptions, SchemaError> {
    let flag = |key: &str| -> Result<bool, SchemaError> {
        match table.get(key) {
            Some(v) => v
                .as_bool()
                .ok_or_else(|| SchemaError::shape(format!("{path}.{key}"), "expected a boolean")),
            None => Ok(false),
        }
    };
    let integer = |key: &str| -> Result<Option<i64>, SchemaError> {
        match table.get(key) {
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| SchemaError::shape(format!("{path}.{key}"), "expected an integer")),
            None => Ok(None),
        }
    };

    let complevel = match integer("complevel")? {
        Some(level @ 0..=9) => Some(level as u32),
        Some(level) => {
            return Err(SchemaError::shape(
                format!("{path}.complevel"),
                format!("compression level must be between 0 and 9, found {level}"),
            ))
        }
        None => None,
    };

    let fill_value = match optional_f64(table, "fill_value", path)? {
        Some(v) => Some(v),
        None => optional_f64(table, ATTR_FILL_VALUE, path)?,
    };

    Ok(StorageOptions {
        fill_value,
        zlib: flag("zlib")?,
        complevel,
        shuffle: flag("shuffle")?,
        least_significant_digit: integer(KEY_LEAST_SIGNIFICANT_DIGIT)?.map(|d| d as i32),
    })
}

fn optional_f64(table: &ConfigTable, key: &str, path: &str) -> Result<Option<f64>, SchemaError> {
    match table.get(key) {
        None | Some(ConfigValue::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            SchemaError::shape(
                format!("{path}.{key}"),
                format!("expected a number, found {}", v.kind()),
            )
        }),
    }
}

fn load_attributes<F>(table: &ConfigTable, path: &str, skip: F) -> Result<AttributeSet, SchemaError>
where
    F: Fn(&str) -> bool,
{
    let mut attributes = AttributeSet::new();
    for (key, value) in table.iter().filter(|(k, _)| !skip(k)) {
        let value = attribute_value(value, &format!("{path}.{key}"))?;
        attributes.insert(key, value);
    }
    Ok(attributes)
}

/// Convert a configuration value into a flat attribute value
pub(crate) fn attribute_value(value: &ConfigValue, path: &str) -> Result<AttributeValue, SchemaError> {
    match value {
        ConfigValue::Text(s) => Ok(AttributeValue::Text(s.clone())),
        ConfigValue::Integer(i) => Ok(AttributeValue::Int(*i)),
        ConfigValue::Float(f) => Ok(AttributeValue::Float(*f)),
        ConfigValue::Bool(b) => Ok(AttributeValue::Int(*b as i64)),
        ConfigValue::List(items) => list_attribute(items, path),
        ConfigValue::Null => Err(SchemaError::shape(path, "attribute values cannot be null")),
        ConfigValue::Table(_) => Err(SchemaError::shape(
            path,
            "attribute values cannot be nested tables",
        )),
    }
}

fn list_attribute(items: &[ConfigValue], path: &str) -> Result<AttributeValue, SchemaError> {
    if items.iter().all(|v| matches!(v, ConfigValue::Integer(_))) && !items.is_empty() {
        return Ok(AttributeValue::Ints(items.iter().filter_map(ConfigValue::as_i64).collect()));
    }
    if items.iter().all(|v| v.as_f64().is_some()) {
        return Ok(AttributeValue::Floats(items.iter().filter_map(ConfigValue::as_f64).collect()));
    }
    if items.iter().all(|v| v.as_str().is_some()) {
        return Ok(AttributeValue::Texts(
            items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        ));
    }
    Err(SchemaError::shape(
        path,
        "attribute lists must hold only numbers or only strings",
    ))
}
