//! The Value type - a tree-shaped data structure.
//!
//! Every node of a document is a `Value`: a scalar, a sequence, or a map.
//! Path walking lives here so the document layer never has to type-check
//! nodes itself.

use std::collections::BTreeMap;

use crate::Path;

/// A node in a document tree.
///
/// # Design Notes
///
/// - Uses `BTreeMap` for deterministic ordering (serialization is canonical)
/// - Includes `Bytes` for opaque leaves; they cross the JSON boundary as tagged base64
/// - Uses `i64` for integers so they round-trip without turning into floats
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value. Distinct from "path doesn't exist".
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Opaque binary data.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check if this value can be walked into by a path.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Array(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get a reference to a nested value by path.
    ///
    /// Returns `None` if the path doesn't exist or can't be navigated
    /// (e.g., trying to index into a string).
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get(component)?,
                Value::Array(arr) => {
                    let index: usize = component.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Get a mutable reference to a nested value by path.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get_mut(component)?,
                Value::Array(arr) => {
                    let index: usize = component.parse().ok()?;
                    arr.get_mut(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Set a value at a path, creating intermediate maps as needed.
    ///
    /// Never fails. A scalar found where the path needs a container is
    /// replaced by a map, so the last writer wins. Setting the root path
    /// replaces the whole tree.
    pub fn set(&mut self, path: &Path, value: Value) {
        let mut current = self;
        for component in path.iter() {
            current = current.slot(component);
        }
        *current = value;
    }

    /// Remove a value at a path, returning it if it existed.
    ///
    /// A missing path, one that runs through a scalar, or the root path is a
    /// no-op. Removing anything but the last element of an array turns the
    /// array into a map keyed by index, so the remaining elements keep their
    /// addresses.
    pub fn remove(&mut self, path: &Path) -> Option<Value> {
        let (parent_path, last) = path.parent_and_last()?;
        let parent = self.get_mut(&parent_path)?;

        if let Value::Array(arr) = &mut *parent {
            let index: usize = last.parse().ok()?;
            if index >= arr.len() {
                return None;
            }
            if index + 1 == arr.len() {
                return arr.pop();
            }
            parent.promote_to_map();
        }

        match parent {
            Value::Map(map) => map.remove(last),
            _ => None,
        }
    }

    /// Turn an array into a map keyed by its stringified indices.
    fn promote_to_map(&mut self) {
        if let Value::Array(arr) = self {
            let entries = std::mem::take(arr)
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect();
            *self = Value::Map(entries);
        }
    }

    /// The child slot for `key`, turning `self` into a container able to
    /// hold it first.
    ///
    /// Arrays accept an existing index or the next one (an append). Any other
    /// key turns an array into a map keyed by its indices, and any scalar
    /// into an empty map.
    fn slot(&mut self, key: &str) -> &mut Value {
        let index = match self {
            Value::Array(arr) => key
                .parse::<usize>()
                .ok()
                .filter(|&index| index <= arr.len()),
            _ => None,
        };

        if index.is_none() {
            self.promote_to_map();
            if !self.is_map() {
                *self = Value::map();
            }
        }

        match (self, index) {
            (Value::Array(arr), Some(index)) => {
                if index == arr.len() {
                    arr.push(Value::Null);
                }
                &mut arr[index]
            }
            (Value::Map(map), _) => map.entry(key.to_string()).or_default(),
            (other, _) => {
                *other = Value::map();
                other.slot(key)
            }
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
