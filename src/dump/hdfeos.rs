//! HDF-EOS `StructMetadata` parser.
//!
//! The blob is ODL-like text, one `KEY=VALUE` per line, nesting given by the
//! number of tab characters:
//!
//! ```text
//! GROUP=GridStructure
//! 	GROUP=GRID_1
//! 		GridName="MOD_Grid_BRDF"
//! 		XDim=2400
//! 		UpperLeftPointMtrs=(-20015109.354000,1111950.519667)
//! 	END_GROUP=GRID_1
//! END_GROUP=GridStructure
//! END
//! ```
//!
//! `GROUP=` and `OBJECT=` lines open a node named by their value. Lines
//! containing `END` are ignored. A key seen twice collects its values into a
//! list.

use crate::schema::{AttributeSet, AttributeValue};

/// A parsed value
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// Key without a value, or a group without children
    Empty,
    /// Single number
    Number(f64),
    /// Single text value
    Text(String),
    /// Comma-separated numbers
    Numbers(Vec<f64>),
    /// Comma-separated text
    Texts(Vec<String>),
    /// Nested group or object
    Node(MetadataTree),
    /// Values of a repeated key
    Repeated(Vec<MetadataValue>),
}

impl MetadataValue {
    fn parse(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | '"' | '+') && !c.is_whitespace())
            .collect();
        if cleaned.contains(',') {
            let parts: Vec<String> = cleaned.split(',').map(str::to_string).collect();
            match parts
                .iter()
                .map(|p| p.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(numbers) => MetadataValue::Numbers(numbers),
                Err(_) => MetadataValue::Texts(parts),
            }
        } else {
            match cleaned.parse::<f64>() {
                Ok(number) => MetadataValue::Number(number),
                Err(_) => MetadataValue::Text(cleaned),
            }
        }
    }

    /// Text form of a value used as a node name
    fn into_key(self) -> String {
        match self {
            MetadataValue::Text(s) => s,
            MetadataValue::Number(n) => n.to_string(),
            MetadataValue::Texts(v) => v.join(","),
            MetadataValue::Numbers(v) => v
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(","),
            _ => String::new(),
        }
    }
}

/// Ordered key/value tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTree {
    entries: Vec<(String, MetadataValue)>,
}

impl MetadataTree {
    /// Value at `key` in this node
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Follow a dotted path, e.g. `GridStructure.GRID_1.XDim`
    pub fn path(&self, path: &str) -> Option<&MetadataValue> {
        let mut parts = path.split('.');
        let mut value = self.get(parts.next()?)?;
        for part in parts {
            match value {
                MetadataValue::Node(node) => value = node.get(part)?,
                _ => return None,
            }
        }
        Some(value)
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries in this node
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when this node has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_or_append(&mut self, key: String, value: MetadataValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            None => self.entries.push((key, value)),
            Some((_, existing)) => {
                if !matches!(existing, MetadataValue::Repeated(_)) {
                    let first = std::mem::replace(existing, MetadataValue::Empty);
                    *existing = MetadataValue::Repeated(vec![first]);
                }
                if let MetadataValue::Repeated(values) = existing {
                    if value != MetadataValue::Empty {
                        values.push(value);
                    }
                }
            }
        }
    }

    /// Leaves as attributes keyed by dotted path.
    ///
    /// Empty leaves are dropped; repeated nodes are numbered (`key.0`, `key.1`).
    pub fn flatten(&self) -> AttributeSet {
        let mut attrs = AttributeSet::new();
        flatten_into(&mut attrs, "", self);
        attrs
    }
}

fn flatten_into(attrs: &mut AttributeSet, prefix: &str, tree: &MetadataTree) {
    for (key, value) in tree.iter() {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        flatten_value(attrs, path, value);
    }
}

fn flatten_value(attrs: &mut AttributeSet, path: String, value: &MetadataValue) {
    match value {
        MetadataValue::Empty => {}
        MetadataValue::Number(n) => attrs.insert(path, *n),
        MetadataValue::Text(s) => attrs.insert(path, s.as_str()),
        MetadataValue::Numbers(v) => attrs.insert(path, v.clone()),
        MetadataValue::Texts(v) => attrs.insert(path, AttributeValue::Texts(v.clone())),
        MetadataValue::Node(node) => flatten_into(attrs, &path, node),
        MetadataValue::Repeated(values) => {
            if let Some(numbers) = values
                .iter()
                .map(|v| match v {
                    MetadataValue::Number(n) => Some(*n),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
            {
                attrs.insert(path, numbers);
            } else if let Some(texts) = values
                .iter()
                .map(|v| match v {
                    MetadataValue::Text(s) => Some(s.clone()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
            {
                attrs.insert(path, AttributeValue::Texts(texts));
            } else {
                for (i, v) in values.iter().enumerate() {
                    flatten_value(attrs, format!("{path}.{i}"), v);
                }
            }
        }
    }
}

struct Line {
    level: usize,
    key: String,
    value: MetadataValue,
}

fn tokenize(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    for line in text.lines() {
        if line.is_empty() || line.contains("END") {
            continue;
        }
        let level = line.matches('\t').count();
        let item: Vec<&str> = line.trim_matches('\t').split('=').collect();
        let key = item[0].to_string();
        let (key, value) = match item.as_slice() {
            [_, raw] => {
                let value = MetadataValue::parse(raw);
                if key.contains("GROUP") || key.contains("OBJECT") {
                    (value.into_key(), MetadataValue::Empty)
                } else {
                    (key, value)
                }
            }
            _ => (key, MetadataValue::Empty),
        };
        lines.push(Line { level, key, value });
    }
    lines
}

fn build(lines: &[Line], pos: &mut usize, level: usize) -> MetadataTree {
    let mut tree = MetadataTree::default();
    while let Some(current) = lines.get(*pos) {
        if current.level < level {
            return tree;
        }
        *pos += 1;
        if current.level > level {
            continue;
        }
        match lines.get(*pos).map(|next| next.level) {
            Some(next) if next > level => {
                let child = build(lines, pos, next);
                tree.insert_or_append(current.key.clone(), MetadataValue::Node(child));
            }
            next => {
                tree.insert_or_append(current.key.clone(), current.value.clone());
                if next.is_some_and(|n| n < level) {
                    return tree;
                }
            }
        }
    }
    tree
}

/// Parse a `StructMetadata` text blob into a tree
pub fn parse_struct_metadata(text: &str) -> MetadataTree {
    let lines = tokenize(text);
    let mut pos = 0;
    build(&lines, &mut pos, 0)
}
