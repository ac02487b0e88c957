use crate::schema::{AttributeSet, AttributeValue};

use super::array::{TypedArray, TypedValues};
use super::error::StoreError;
use super::{ArraySource, ArrayTarget, DimensionInfo, VariableDef, VariableInfo};

/// Deepest group level below the root
const MAX_GROUP_DEPTH: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredVariable {
    pub(crate) def: VariableDef,
    pub(crate) attributes: AttributeSet,
    pub(crate) data: Option<TypedArray>,
}

/// In-memory array file: one scope plus its groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDataset {
    name: String,
    depth: usize,
    attributes: AttributeSet,
    dimensions: Vec<DimensionInfo>,
    variables: Vec<StoredVariable>,
    groups: Vec<MemoryDataset>,
}

impl MemoryDataset {
    /// Create an empty root scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope name (empty for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Typed group access
    pub fn group_dataset(&self, name: &str) -> Option<&MemoryDataset> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub(crate) fn stored_variables(&self) -> &[StoredVariable] {
        &self.variables
    }

    pub(crate) fn groups(&self) -> &[MemoryDataset] {
        &self.groups
    }

    pub(crate) fn restore_dimension(&mut self, info: DimensionInfo) {
        self.dimensions.push(info);
    }

    pub(crate) fn restore_variable(
        &mut self,
        def: VariableDef,
        attributes: AttributeSet,
        data: Option<TypedArray>,
    ) {
        self.variables.push(StoredVariable {
            def,
            attributes,
            data,
        });
    }

    pub(crate) fn restore_group(&mut self, mut group: MemoryDataset) -> Result<(), StoreError> {
        if self.depth >= MAX_GROUP_DEPTH || !group.groups.is_empty() {
            return Err(StoreError::NestingTooDeep(group.name));
        }
        group.depth = self.depth + 1;
        self.groups.push(group);
        Ok(())
    }

    pub(crate) fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn variable_mut(&mut self, name: &str) -> Result<&mut StoredVariable, StoreError> {
        self.variables
            .iter_mut()
            .find(|v| v.def.name == name)
            .ok_or_else(|| StoreError::not_found("Variable", name))
    }

    fn stored(&self, name: &str) -> Result<&StoredVariable, StoreError> {
        self.variables
            .iter()
            .find(|v| v.def.name == name)
            .ok_or_else(|| StoreError::not_found("Variable", name))
    }

    fn dimension_index(&self, name: &str) -> Result<usize, StoreError> {
        self.dimensions
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| StoreError::not_found("Dimension", name))
    }

    fn current_shape(&self, def: &VariableDef) -> Vec<usize> {
        def.dimensions
            .iter()
            .map(|d| {
                self.dimensions
                    .iter()
                    .find(|info| info.name == *d)
                    .map_or(0, |info| info.length)
            })
            .collect()
    }

    /// Check extents against the variable's dimensions and grow unlimited ones.
    fn fit_extents(&mut self, def: &VariableDef, extents: &[usize]) -> Result<(), StoreError> {
        for (dim_name, &extent) in def.dimensions.iter().zip(extents) {
            let idx = self.dimension_index(dim_name)?;
            let dim = &mut self.dimensions[idx];
            if dim.unlimited {
                dim.length = dim.length.max(extent);
            } else if dim.length != extent {
                return Err(StoreError::shape(
                    &def.name,
                    format!(
                        "dimension '{}' has length {}, data has {extent}",
                        dim.name, dim.length
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl ArrayTarget for MemoryDataset {
    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), StoreError> {
        self.attributes.insert(name, value);
        Ok(())
    }

    fn create_dimension(&mut self, name: &str, length: Option<usize>) -> Result<(), StoreError> {
        if self.dimensions.iter().any(|d| d.name == name) {
            return Err(StoreError::AlreadyExists {
                kind: "Dimension",
                name: name.to_string(),
            });
        }
        self.dimensions.push(DimensionInfo {
            name: name.to_string(),
            length: length.unwrap_or(0),
            unlimited: length.is_none(),
        });
        Ok(())
    }

    fn create_variable(&mut self, def: VariableDef) -> Result<(), StoreError> {
        if self.variables.iter().any(|v| v.def.name == def.name) {
            return Err(StoreError::AlreadyExists {
                kind: "Variable",
                name: def.name,
            });
        }
        for dim in &def.dimensions {
            self.dimension_index(dim)?;
        }
        self.variables.push(StoredVariable {
            def,
            attributes: AttributeSet::new(),
            data: None,
        });
        Ok(())
    }

    fn set_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), StoreError> {
        self.variable_mut(variable)?.attributes.insert(name, value);
        Ok(())
    }

    fn write(&mut self, variable: &str, data: TypedArray) -> Result<(), StoreError> {
        let def = self.stored(variable)?.def.clone();
        if data.dtype() != def.dtype {
            return Err(StoreError::shape(
                variable,
                format!("expected {} data, found {}", def.dtype, data.dtype()),
            ));
        }
        if data.shape().len() != def.dimensions.len() {
            return Err(StoreError::shape(
                variable,
                format!(
                    "variable has rank {}, data has rank {}",
                    def.dimensions.len(),
                    data.shape().len()
                ),
            ));
        }
        self.fit_extents(&def, data.shape())?;
        self.variable_mut(variable)?.data = Some(data);
        Ok(())
    }

    fn write_record(
        &mut self,
        variable: &str,
        index: usize,
        record: TypedArray,
    ) -> Result<(), StoreError> {
        let def = self.stored(variable)?.def.clone();
        let leading = def
            .dimensions
            .first()
            .ok_or_else(|| StoreError::shape(variable, "scalar variables have no records"))?;
        let leading_idx = self.dimension_index(leading)?;
        if !self.dimensions[leading_idx].unlimited {
            return Err(StoreError::shape(
                variable,
                format!("leading dimension '{leading}' is not unlimited"),
            ));
        }
        if record.shape().len() + 1 != def.dimensions.len() {
            return Err(StoreError::shape(
                variable,
                format!(
                    "records of a rank {} variable need rank {}, found {}",
                    def.dimensions.len(),
                    def.dimensions.len() - 1,
                    record.shape().len()
                ),
            ));
        }

        let mut extents = vec![index + 1];
        extents.extend_from_slice(record.shape());
        self.fit_extents(&def, &extents)?;

        let fill = def.fill_value();
        let record_shape = record.shape().to_vec();
        let record_len = record.len();
        let slot = self.variable_mut(variable)?;
        let data = slot.data.get_or_insert_with(|| {
            let mut shape = vec![0];
            shape.extend_from_slice(&record_shape);
            TypedArray::filled(def.dtype, shape, fill)
        });

        if data.shape()[1..] != record_shape[..] {
            if data.shape()[0] == 0 {
                data.shape_mut().truncate(1);
                data.shape_mut().extend_from_slice(&record_shape);
            } else {
                return Err(StoreError::shape(
                    variable,
                    format!(
                        "record shape {:?} differs from stored records {:?}",
                        record_shape,
                        &data.shape()[1..]
                    ),
                ));
            }
        }

        data.values_mut()
            .put_record(index, record_len, record.values(), fill)
            .map_err(|found: TypedValues| {
                StoreError::shape(
                    variable,
                    format!("expected {} data, found {}", def.dtype, found.dtype()),
                )
            })?;
        let rows = data.shape()[0].max(index + 1);
        data.shape_mut()[0] = rows;
        Ok(())
    }

    fn create_group(&mut self, name: &str) -> Result<&mut dyn ArrayTarget, StoreError> {
        if self.depth >= MAX_GROUP_DEPTH {
            return Err(StoreError::NestingTooDeep(name.to_string()));
        }
        if self.groups.iter().any(|g| g.name == name) {
            return Err(StoreError::AlreadyExists {
                kind: "Group",
                name: name.to_string(),
            });
        }
        self.groups.push(MemoryDataset {
            name: name.to_string(),
            depth: self.depth + 1,
            ..Default::default()
        });
        let idx = self.groups.len() - 1;
        Ok(&mut self.groups[idx])
    }

    fn group_mut(&mut self, name: &str) -> Option<&mut dyn ArrayTarget> {
        self.groups
            .iter_mut()
            .find(|g| g.name == name)
            .map(|g| g as &mut dyn ArrayTarget)
    }

    fn dimension(&self, name: &str) -> Option<DimensionInfo> {
        self.dimensions.iter().find(|d| d.name == name).cloned()
    }
}

impl ArraySource for MemoryDataset {
    fn attributes(&self) -> AttributeSet {
        self.attributes.clone()
    }

    fn dimensions(&self) -> Vec<DimensionInfo> {
        self.dimensions.clone()
    }

    fn variables(&self) -> Vec<VariableInfo> {
        self.variables
            .iter()
            .map(|v| VariableInfo {
                name: v.def.name.clone(),
                dtype: v.def.dtype,
                dimensions: v.def.dimensions.clone(),
                shape: self.current_shape(&v.def),
                attributes: v.attributes.clone(),
                storage: v.def.storage.clone(),
            })
            .collect()
    }

    fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    fn group(&self, name: &str) -> Option<&dyn ArraySource> {
        self.group_dataset(name).map(|g| g as &dyn ArraySource)
    }

    fn read(&self, variable: &str) -> Result<TypedArray, StoreError> {
        let stored = self.stored(variable)?;
        let shape = self.current_shape(&stored.def);
        let fill = stored.def.fill_value();
        Ok(match &stored.data {
            Some(data) => data.pad_to(&shape, fill),
            None => TypedArray::filled(stored.def.dtype, shape, fill),
        })
    }
}
