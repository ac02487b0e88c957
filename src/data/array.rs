use crate::config::ConfigValue;

use super::error::DataError;

/// Flat element storage of an [`NdArray`]
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Floating point elements; NaN marks missing values
    Float(Vec<f64>),
    /// Integer elements
    Int(Vec<i64>),
    /// Text elements
    Text(Vec<String>),
}

impl Values {
    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }

    /// True when there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short element kind name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Values::Float(_) => "float",
            Values::Int(_) => "integer",
            Values::Text(_) => "text",
        }
    }

    /// Numeric elements widened to `f64`; `None` for text
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Values::Float(v) => Some(v.clone()),
            Values::Int(v) => Some(v.iter().map(|&i| i as f64).collect()),
            Values::Text(_) => None,
        }
    }

    /// Text elements; `None` for numbers
    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Values::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<f64>> for Values {
    fn from(v: Vec<f64>) -> Self {
        Values::Float(v)
    }
}

impl From<Vec<i64>> for Values {
    fn from(v: Vec<i64>) -> Self {
        Values::Int(v)
    }
}

impl From<Vec<String>> for Values {
    fn from(v: Vec<String>) -> Self {
        Values::Text(v)
    }
}

impl From<Vec<&str>> for Values {
    fn from(v: Vec<&str>) -> Self {
        Values::Text(v.into_iter().map(str::to_string).collect())
    }
}

/// An n-dimensional array in row-major order.
///
/// Invariant: the product of `shape` equals the number of values. A rank-0
/// array holds exactly one value.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    values: Values,
}

impl NdArray {
    /// Create an array, checking the element count against the shape
    pub fn new(shape: Vec<usize>, values: impl Into<Values>) -> Result<Self, DataError> {
        let values = values.into();
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(DataError::ShapeMismatch {
                shape,
                found: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// One-dimensional array over the given values
    pub fn from_vec(values: impl Into<Values>) -> Self {
        let values = values.into();
        Self {
            shape: vec![values.len()],
            values,
        }
    }

    /// Rank-0 integer
    pub fn scalar_int(value: i64) -> Self {
        Self {
            shape: Vec::new(),
            values: Values::Int(vec![value]),
        }
    }

    /// Rank-0 float
    pub fn scalar_float(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            values: Values::Float(vec![value]),
        }
    }

    /// Rank-0 text
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            shape: Vec::new(),
            values: Values::Text(vec![value.into()]),
        }
    }

    /// Reinterpret the values with a new shape of the same element count
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self, DataError> {
        Self::new(shape, self.values)
    }

    /// Extent along each axis
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True for rank-0 arrays
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Flat element storage
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Consume the array, returning shape and values
    pub fn into_parts(self) -> (Vec<usize>, Values) {
        (self.shape, self.values)
    }

    /// A non-negative integer scalar read as a length
    pub fn as_size(&self) -> Option<usize> {
        match (&self.values, self.is_scalar()) {
            (Values::Int(v), true) => usize::try_from(v[0]).ok(),
            _ => None,
        }
    }

    /// Build an array from nested lists, inferring the shape.
    ///
    /// `null` leaves become NaN. Every list at the same depth must have the
    /// same length, and leaves must be all numbers or all strings.
    pub fn from_config_value(value: &ConfigValue, path: &str) -> Result<Self, DataError> {
        let mut shape = Vec::new();
        let mut probe = value;
        while let ConfigValue::List(items) = probe {
            shape.push(items.len());
            match items.first() {
                Some(first) => probe = first,
                None => break,
            }
        }

        let mut leaves = Vec::with_capacity(shape.iter().product());
        collect_leaves(value, &shape, 0, path, &mut leaves)?;

        let values = if leaves.iter().all(|l| matches!(l, ConfigValue::Text(_))) && !leaves.is_empty() {
            Values::Text(leaves.iter().filter_map(|l| l.as_str().map(str::to_string)).collect())
        } else if leaves.iter().all(|l| matches!(l, ConfigValue::Integer(_))) {
            Values::Int(leaves.iter().filter_map(|l| l.as_i64()).collect())
        } else {
            let mut floats = Vec::with_capacity(leaves.len());
            for leaf in &leaves {
                match leaf {
                    ConfigValue::Integer(i) => floats.push(*i as f64),
                    ConfigValue::Float(f) => floats.push(*f),
                    ConfigValue::Null => floats.push(f64::NAN),
                    other => {
                        return Err(DataError::MixedTypes {
                            path: path.to_string(),
                            found: other.kind().to_string(),
                        })
                    }
                }
            }
            Values::Float(floats)
        };

        Self::new(shape, values)
    }
}

fn collect_leaves<'a>(
    value: &'a ConfigValue,
    shape: &[usize],
    depth: usize,
    path: &str,
    out: &mut Vec<&'a ConfigValue>,
) -> Result<(), DataError> {
    match value {
        ConfigValue::List(items) => {
            if depth >= shape.len() || items.len() != shape[depth] {
                return Err(DataError::Ragged {
                    path: path.to_string(),
                    depth,
                });
            }
            for item in items {
                collect_leaves(item, shape, depth + 1, path, out)?;
            }
            Ok(())
        }
        ConfigValue::Table(_) | ConfigValue::Bool(_) => Err(DataError::Unsupported {
            path: path.to_string(),
            kind: value.kind().to_string(),
        }),
        leaf if depth == shape.len() => {
            out.push(leaf);
            Ok(())
        }
        _ => Err(DataError::Ragged {
            path: path.to_string(),
            depth,
        }),
    }
}

impl From<Vec<f64>> for NdArray {
    fn from(v: Vec<f64>) -> Self {
        NdArray::from_vec(v)
    }
}

impl From<Vec<i64>> for NdArray {
    fn from(v: Vec<i64>) -> Self {
        NdArray::from_vec(v)
    }
}

impl From<i64> for NdArray {
    fn from(v: i64) -> Self {
        NdArray::scalar_int(v)
    }
}

impl From<f64> for NdArray {
    fn from(v: f64) -> Self {
        NdArray::scalar_float(v)
    }
}

impl From<&str> for NdArray {
    fn from(v: &str) -> Self {
        NdArray::text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDocument;

    fn parse(json: &str) -> Result<NdArray, DataError> {
        let doc = ConfigDocument::from_json_str(&format!(r#"{{"x": {json}}}"#)).unwrap();
        NdArray::from_config_value(doc.root().get("x").unwrap(), "x")
    }

    #[test]
    fn test_shape_inference() {
        let a = parse("[[1, 2, 3], [4, 5, 6]]").unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a.values(), &Values::Int(vec![1, 2, 3, 4, 5, 6]));

        let a = parse("[1, 2.5, null]").unwrap();
        assert_eq!(a.shape(), &[3]);
        match a.values() {
            Values::Float(v) => assert!(v[2].is_nan()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse("7").unwrap().as_size(), Some(7));
        assert_eq!(parse("-1").unwrap().as_size(), None);
        let t = parse(r#""hello""#).unwrap();
        assert!(t.is_scalar());
        assert_eq!(t.values().as_text(), Some(&["hello".to_string()][..]));
    }

    #[test]
    fn test_ragged_rejected() {
        assert!(matches!(parse("[[1, 2], [3]]"), Err(DataError::Ragged { .. })));
        assert!(matches!(parse("[[1, 2], 3]"), Err(DataError::Ragged { .. })));
    }

    #[test]
    fn test_mixed_rejected() {
        assert!(matches!(parse(r#"[1, "a"]"#), Err(DataError::MixedTypes { .. })));
        assert!(matches!(parse("[true]"), Err(DataError::Unsupported { .. })));
    }

    #[test]
    fn test_new_checks_count() {
        assert!(NdArray::new(vec![2, 2], vec![1.0, 2.0, 3.0]).is_err());
        let a = NdArray::new(vec![], vec![4i64]).unwrap();
        assert_eq!(a.as_size(), Some(4));
    }

    #[test]
    fn test_empty_list() {
        let a = parse("[]").unwrap();
        assert_eq!(a.shape(), &[0]);
        assert!(a.is_empty());
    }
}
