use serde::{Deserialize, Serialize};

use super::attributes::AttributeSet;
use super::dtype::DataType;

/// How the length of a dimension is determined.
///
/// Assigned once by the loader from the presence of `size` / `dat` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Explicit length from the `size` key
    Fixed(usize),
    /// Length taken from the data binding named by the `dat` key
    FromData(String),
    /// No `size` and no `dat`: grows as data is written along it
    Unlimited,
}

impl Cardinality {
    /// True for [`Cardinality::Unlimited`]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Cardinality::Unlimited)
    }
}

/// Declaration of a named axis
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSpec {
    /// Dimension name, unique within its scope
    pub name: String,
    /// Attributes attached to the coordinate variable
    pub attributes: AttributeSet,
    /// Element type of the coordinate variable
    pub dtype: Option<DataType>,
    /// Raw `dtype` string as written, kept for error reporting
    pub dtype_name: Option<String>,
    /// Length rule
    pub cardinality: Cardinality,
    /// Whether a coordinate variable is created (config key `var`)
    pub create_variable: bool,
    /// Storage options of the coordinate variable
    pub storage: StorageOptions,
}

impl DimensionSpec {
    /// Fixed-size dimension with a float64 coordinate variable
    pub fn fixed(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, Cardinality::Fixed(size))
    }

    /// Unlimited dimension with a float64 coordinate variable
    pub fn unlimited(name: impl Into<String>) -> Self {
        Self::new(name, Cardinality::Unlimited)
    }

    /// Dimension sized from a data binding
    pub fn from_data(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(name, Cardinality::FromData(key.into()))
    }

    fn new(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeSet::new(),
            dtype: Some(DataType::Float64),
            dtype_name: None,
            cardinality,
            create_variable: true,
            storage: StorageOptions::default(),
        }
    }

    /// Set the coordinate type
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Add an attribute
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<super::AttributeValue>,
    ) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// True if this dimension grows with appended data
    pub fn is_unlimited(&self) -> bool {
        self.cardinality.is_unlimited()
    }
}

/// Linear quantization of floating data into an integer type.
///
/// `packed = round((raw - add_offset) / scale_factor)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackingSpec {
    /// Multiplier applied when unpacking
    pub scale_factor: f64,
    /// Offset applied when unpacking
    pub add_offset: f64,
    /// Declared `actual_range` / `valid_range`, if any
    pub range: Option<[f64; 2]>,
}

impl PackingSpec {
    /// Create a packing spec without a declared range
    pub fn new(scale_factor: f64, add_offset: f64) -> Self {
        Self {
            scale_factor,
            add_offset,
            range: None,
        }
    }

    /// Quantize one raw value (no clamping)
    #[inline]
    pub fn pack(&self, raw: f64) -> f64 {
        ((raw - self.add_offset) / self.scale_factor).round()
    }

    /// Reconstruct a raw value from its packed form
    #[inline]
    pub fn unpack(&self, packed: f64) -> f64 {
        packed * self.scale_factor + self.add_offset
    }
}

/// Storage options carried over from netCDF4 variable creation keywords
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageOptions {
    /// Fill value replacing missing (NaN) data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<f64>,
    /// Deflate compression requested
    #[serde(default)]
    pub zlib: bool,
    /// Deflate level (1-9)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complevel: Option<u32>,
    /// Byte shuffle before compression
    #[serde(default)]
    pub shuffle: bool,
    /// Decimal digits of precision to retain for float data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub least_significant_digit: Option<i32>,
}

/// Declaration of a typed multi-dimensional array
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Variable name, unique within its scope
    pub name: String,
    /// Variable attributes
    pub attributes: AttributeSet,
    /// Element type
    pub dtype: Option<DataType>,
    /// Raw `dtype` string as written, kept for error reporting
    pub dtype_name: String,
    /// Ordered dimension references; defines rank and axis order
    pub dimensions: Vec<String>,
    /// Optional scale/offset packing
    pub packing: Option<PackingSpec>,
    /// Storage options
    pub storage: StorageOptions,
}

impl VariableSpec {
    /// Create a variable over the given dimensions
    pub fn new<I, S>(name: impl Into<String>, dtype: DataType, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            attributes: AttributeSet::new(),
            dtype: Some(dtype),
            dtype_name: dtype.to_string(),
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            packing: None,
            storage: StorageOptions::default(),
        }
    }

    /// Add an attribute
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<super::AttributeValue>,
    ) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Attach packing parameters (also recorded as attributes)
    pub fn with_packing(mut self, packing: PackingSpec) -> Self {
        self.attributes.insert("scale_factor", packing.scale_factor);
        self.attributes.insert("add_offset", packing.add_offset);
        if let Some(range) = packing.range {
            self.attributes.insert("actual_range", range.to_vec());
        }
        self.packing = Some(packing);
        self
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }
}

/// A named sub-scope one level below the root
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupSpec {
    /// Group name
    pub name: String,
    /// Group attributes
    pub attributes: AttributeSet,
    /// Dimensions scoped to this group
    pub dimensions: Vec<DimensionSpec>,
    /// Variables scoped to this group
    pub variables: Vec<VariableSpec>,
}

impl GroupSpec {
    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a dimension of this group
    pub fn dimension(&self, name: &str) -> Option<&DimensionSpec> {
        self.dimensions.iter().find(|d| d.name == name)
    }
}

/// Complete file structure: root scope plus optional groups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// Global attributes
    pub global_attributes: AttributeSet,
    /// Root dimensions
    pub dimensions: Vec<DimensionSpec>,
    /// Root variables
    pub variables: Vec<VariableSpec>,
    /// Groups in declaration order
    pub groups: Vec<GroupSpec>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a root dimension
    pub fn dimension(&self, name: &str) -> Option<&DimensionSpec> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Look up a root variable
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Look up a group
    pub fn group(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Root dimensions classified unlimited, in declaration order
    pub fn unlimited_dimensions(&self) -> impl Iterator<Item = &DimensionSpec> {
        self.dimensions.iter().filter(|d| d.is_unlimited())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_scenario() {
        let p = PackingSpec::new(0.586, 37.5);
        assert_eq!(p.pack(50.0), 21.0);
        assert!((p.unpack(21.0) - 50.0).abs() <= 0.586);
    }

    #[test]
    fn test_with_packing_records_attributes() {
        let v = VariableSpec::new("pwat", DataType::Int8, ["time"]).with_packing(PackingSpec {
            scale_factor: 0.5,
            add_offset: 1.0,
            range: Some([0.0, 75.0]),
        });
        assert_eq!(v.attributes.get("scale_factor").unwrap().as_f64(), Some(0.5));
        assert!(v.attributes.contains("actual_range"));
        assert_eq!(v.rank(), 1);
    }

    #[test]
    fn test_unlimited_listing() {
        let schema = Schema {
            dimensions: vec![
                DimensionSpec::unlimited("time"),
                DimensionSpec::fixed("lat", 3),
            ],
            ..Default::default()
        };
        let names: Vec<&str> = schema.unlimited_dimensions().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["time"]);
    }
}
