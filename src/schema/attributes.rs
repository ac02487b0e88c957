//! Attribute values and ordered attribute sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dtype::DataType;

/// Value of a single metadata attribute.
///
/// Attributes are flat: a scalar or a small homogeneous list, never nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// Text attribute
    Text(String),
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(#[serde(with = "float_repr")] f64),
    /// List of integers
    Ints(Vec<i64>),
    /// List of floats
    Floats(#[serde(with = "float_repr::list")] Vec<f64>),
    /// List of strings
    Texts(Vec<String>),
}

impl AttributeValue {
    /// Scalar numeric view
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric list view (scalars become single-element lists)
    pub fn as_f64_list(&self) -> Option<Vec<f64>> {
        match self {
            AttributeValue::Int(i) => Some(vec![*i as f64]),
            AttributeValue::Float(f) => Some(vec![*f]),
            AttributeValue::Ints(v) => Some(v.iter().map(|i| *i as f64).collect()),
            AttributeValue::Floats(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Text view
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for numeric scalars and lists
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributeValue::Int(_)
                | AttributeValue::Float(_)
                | AttributeValue::Ints(_)
                | AttributeValue::Floats(_)
        )
    }

    /// Convert numeric values to the representation `dtype` would store.
    ///
    /// Integer types truncate and saturate, `float32` rounds through `f32`.
    /// Text values and non-numeric types are returned unchanged.
    pub fn coerce_to(&self, dtype: DataType) -> AttributeValue {
        if !dtype.is_numeric() {
            return self.clone();
        }
        let convert = |x: f64| dtype.cast_f64(x);
        match self {
            AttributeValue::Int(_) | AttributeValue::Float(_) => {
                let x = convert(self.as_f64().unwrap_or_default());
                if dtype.is_integer() {
                    AttributeValue::Int(x as i64)
                } else {
                    AttributeValue::Float(x)
                }
            }
            AttributeValue::Ints(_) | AttributeValue::Floats(_) => {
                let values: Vec<f64> = self
                    .as_f64_list()
                    .unwrap_or_default()
                    .into_iter()
                    .map(convert)
                    .collect();
                if dtype.is_integer() {
                    AttributeValue::Ints(values.into_iter().map(|x| x as i64).collect())
                } else {
                    AttributeValue::Floats(values)
                }
            }
            AttributeValue::Text(_) | AttributeValue::Texts(_) => self.clone(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            AttributeValue::Text(s) => write!(f, "{s:?}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Ints(v) => join(f, v),
            AttributeValue::Floats(v) => join(f, v),
            AttributeValue::Texts(v) => {
                let quoted: Vec<String> = v.iter().map(|s| format!("{s:?}")).collect();
                join(f, &quoted)
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        AttributeValue::Float(x)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(v: Vec<f64>) -> Self {
        AttributeValue::Floats(v)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(v: Vec<i64>) -> Self {
        AttributeValue::Ints(v)
    }
}

/// A named attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Attribute value
    pub value: AttributeValue,
}

/// Ordered mapping from attribute name to value with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet {
    entries: Vec<Attribute>,
}

impl AttributeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute; an existing key keeps its position and takes the new value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Attribute { name, value }),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up an attribute value
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// True if the name is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove an attribute, returning its value
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let idx = self.entries.iter().position(|a| a.name == name)?;
        Some(self.entries.remove(idx).value)
    }

    /// Insert every attribute of `other`, overriding existing keys
    pub fn merge(&mut self, other: &AttributeSet) {
        for attr in other.iter() {
            self.insert(attr.name.clone(), attr.value.clone());
        }
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// Attribute names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|a| a.name.as_str())
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// JSON has no NaN or infinity, so non-finite floats travel as strings.
mod float_repr {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Text(String),
    }

    impl Repr {
        fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
            match self {
                Repr::Num(x) => Ok(x),
                Repr::Text(t) => t.parse::<f64>().map_err(E::custom),
            }
        }
    }

    struct Finite(f64);

    impl Serialize for Finite {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            serialize(&self.0, s)
        }
    }

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else {
            s.serialize_str(&value.to_string())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Repr::deserialize(d)?.into_f64()
    }

    pub mod list {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S: Serializer>(values: &[f64], s: S) -> Result<S::Ok, S::Error> {
            let mut seq = s.serialize_seq(Some(values.len()))?;
            for v in values {
                seq.serialize_element(&Finite(*v))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
            Vec::<Repr>::deserialize(d)?
                .into_iter()
                .map(|r| r.into_f64::<D::Error>())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut attrs = AttributeSet::new().with("units", "K").with("long_name", "temp");
        attrs.insert("units", "degC");
        let names: Vec<&str> = attrs.names().collect();
        assert_eq!(names, vec!["units", "long_name"]);
        assert_eq!(attrs.get("units").unwrap().as_text(), Some("degC"));
    }

    #[test]
    fn test_coerce_to_integer_type() {
        let v = AttributeValue::Float(-3.9).coerce_to(DataType::Int16);
        assert_eq!(v, AttributeValue::Int(-3));
        let v = AttributeValue::Floats(vec![0.5, 300.0]).coerce_to(DataType::Int8);
        assert_eq!(v, AttributeValue::Ints(vec![0, 127]));
    }

    #[test]
    fn test_coerce_to_float_type() {
        let v = AttributeValue::Int(0).coerce_to(DataType::Float64);
        assert_eq!(v, AttributeValue::Float(0.0));
        let v = AttributeValue::Text("m".into()).coerce_to(DataType::Float32);
        assert_eq!(v, AttributeValue::Text("m".into()));
    }

    #[test]
    fn test_serde_non_finite_floats() {
        let attrs = AttributeSet::new()
            .with("_FillValue", f64::NAN)
            .with("valid_range", vec![f64::NEG_INFINITY, 1.5]);
        let json = serde_json::to_string(&attrs).unwrap();
        let back: AttributeSet = serde_json::from_str(&json).unwrap();
        assert!(back.get("_FillValue").unwrap().as_f64().unwrap().is_nan());
        assert_eq!(
            back.get("valid_range"),
            Some(&AttributeValue::Floats(vec![f64::NEG_INFINITY, 1.5]))
        );
    }

    #[test]
    fn test_serde_preserves_int_vs_float() {
        let attrs = AttributeSet::new().with("a", 1i64).with("b", 1.0);
        let json = serde_json::to_string(&attrs).unwrap();
        let back: AttributeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }

    #[test]
    fn test_merge_overrides() {
        let mut a = AttributeSet::new().with("title", "a").with("x", 1i64);
        let b = AttributeSet::new().with("title", "b").with("y", 2i64);
        a.merge(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.get("title").unwrap().as_text(), Some("b"));
    }
}
