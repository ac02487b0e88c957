use std::fmt;

/// Loosely-typed configuration value.
///
/// Mirrors what a hand-written TOML or JSON document can express, so the
/// schema mapping step can reject anything that does not fit the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Explicit `null` (JSON only)
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Float(f64),
    /// String literal (TOML datetimes are kept as their text form)
    Text(String),
    /// Ordered list
    List(Vec<ConfigValue>),
    /// Ordered key/value table
    Table(ConfigTable),
}

impl ConfigValue {
    /// Convert a parsed JSON value.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ConfigValue::Null,
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Integer(i),
                None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ConfigValue::Text(s),
            Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from_json).collect())
            }
            Value::Object(map) => ConfigValue::Table(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a parsed TOML value.
    pub fn from_toml(value: toml::Value) -> Self {
        use toml::Value;
        match value {
            Value::Boolean(b) => ConfigValue::Bool(b),
            Value::Integer(i) => ConfigValue::Integer(i),
            Value::Float(f) => ConfigValue::Float(f),
            Value::String(s) => ConfigValue::Text(s),
            Value::Datetime(dt) => ConfigValue::Text(dt.to_string()),
            Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from_toml).collect())
            }
            Value::Table(map) => ConfigValue::Table(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from_toml(v)))
                    .collect(),
            ),
        }
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Text(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Table(_) => "table",
        }
    }

    /// Borrow as a table
    pub fn as_table(&self) -> Option<&ConfigTable> {
        match self {
            ConfigValue::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Borrow as text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view (floats with no fractional part are accepted)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            ConfigValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Numeric view of integers and floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Integer(i) => Some(*i as f64),
            ConfigValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean view; integers 0/1 are accepted as in Python configs
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::Integer(0) => Some(false),
            ConfigValue::Integer(1) => Some(true),
            _ => None,
        }
    }

    /// True for explicit `null`
    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Integer(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::Text(s) => write!(f, "{s:?}"),
            ConfigValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ConfigValue::Table(t) => write!(f, "{{table with {} keys}}", t.len()),
        }
    }
}

/// Ordered table of configuration values.
///
/// Keys keep the order in which they appeared in the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTable {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// True if the key is present (even with a `null` value)
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace a value, keeping the original position on replace
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Iterate over entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over keys in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigTable {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        let mut table = ConfigTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        ConfigValue::Float(x)
    }
}

impl From<ConfigTable> for ConfigValue {
    fn from(t: ConfigTable) -> Self {
        ConfigValue::Table(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut t = ConfigTable::new()
            .with("a", 1i64.into())
            .with("b", 2i64.into());
        t.insert("a", 3i64.into());
        let keys: Vec<&str> = t.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(t.get("a"), Some(&ConfigValue::Integer(3)));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(ConfigValue::Float(10.0).as_i64(), Some(10));
        assert_eq!(ConfigValue::Float(10.5).as_i64(), None);
        assert_eq!(ConfigValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(ConfigValue::Integer(1).as_bool(), Some(true));
        assert_eq!(ConfigValue::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn test_json_large_unsigned_becomes_float() {
        let v = ConfigValue::from_json(serde_json::json!(u64::MAX));
        assert!(matches!(v, ConfigValue::Float(_)));
    }

    #[test]
    fn test_toml_datetime_becomes_text() {
        let table: toml::Table = toml::from_str("created = 1979-05-27T07:32:00Z").unwrap();
        let v = ConfigValue::from_toml(toml::Value::Table(table));
        let t = v.as_table().unwrap();
        assert_eq!(t.get("created").unwrap().as_str(), Some("1979-05-27T07:32:00Z"));
    }
}
