//! The path document: a nested tree addressed by dot-separated paths.

use std::collections::BTreeMap;

use crate::convert::{from_json_str, to_json_string};
use crate::{Error, Path, Result, Value};

/// An in-memory tree of values addressed by dot-separated paths.
///
/// The document knows nothing about locales or attributes. Reads never
/// mutate, writes create whatever intermediate maps they need, and removals
/// of missing paths are silently absorbed.
///
/// # Example
///
/// ```rust
/// use dynattr_document::{PathDocument, Value};
///
/// let mut document = PathDocument::new();
/// document.set("title.nl", "Hallo");
/// document.set("title.en", Value::Null);
///
/// assert_eq!(document.get("title.nl"), Some(&Value::from("Hallo")));
/// assert!(document.has("title.en"));
/// assert!(!document.has("title.fr"));
/// assert_eq!(document.serialize().unwrap(), r#"{"title":{"en":null,"nl":"Hallo"}}"#);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PathDocument {
    values: Value,
}

impl PathDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            values: Value::map(),
        }
    }

    /// Create a document over an existing tree.
    pub fn from_values(values: impl Into<Value>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Check whether anything, `Null` included, is stored at `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The value stored at `key`, or `None` if any segment is missing.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_path(&Path::parse(key))
    }

    /// The value stored at `key`, or `default` if any segment is missing.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        self.values.get(path)
    }

    /// Store `value` at `key`, creating or overwriting intermediate nodes.
    ///
    /// A key with no segments addresses no entry and is ignored.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.set_path(&Path::parse(key), value.into());
    }

    pub fn set_path(&mut self, path: &Path, value: Value) {
        if path.is_empty() {
            tracing::debug!("ignoring write to the document root");
            return;
        }
        self.values.set(path, value);
    }

    /// Remove the value at `key`, returning it if it was present.
    ///
    /// Removing an inner element of a sequence leaves a hole: the sequence
    /// becomes a map keyed by index and its other elements keep their keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.remove_path(&Path::parse(key))
    }

    pub fn remove_path(&mut self, path: &Path) -> Option<Value> {
        self.values.remove(path)
    }

    /// The full backing tree.
    pub fn all(&self) -> &Value {
        &self.values
    }

    pub fn into_values(self) -> Value {
        self.values
    }

    /// A new document whose top level is this document's top level with
    /// `other` laid over it. Not recursive; `self` is left untouched.
    pub fn merge(&self, other: BTreeMap<String, Value>) -> PathDocument {
        let values = match &self.values {
            Value::Map(current) => {
                let mut merged = current.clone();
                merged.extend(other);
                Value::Map(merged)
            }
            // Nothing at top level to union with
            current if other.is_empty() => current.clone(),
            _ => Value::Map(other),
        };
        PathDocument { values }
    }

    /// Merge a raw storage payload into a new document.
    ///
    /// Accepts `Null` (nothing to merge), a structured map, or JSON text
    /// (as a string or UTF-8 bytes) whose top level is an object or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocumentPayload`] for anything else, so
    /// corrupt storage is never mistaken for an empty document.
    pub fn merge_payload(&self, payload: &Value) -> Result<PathDocument> {
        Ok(self.merge(payload_entries(payload)?))
    }

    /// Canonical JSON text of the whole tree.
    pub fn serialize(&self) -> Result<String> {
        to_json_string(&self.values)
    }
}

impl Default for PathDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for PathDocument {
    fn from(values: Value) -> Self {
        Self::from_values(values)
    }
}

impl From<BTreeMap<String, Value>> for PathDocument {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self::from_values(Value::Map(values))
    }
}

/// The top-level entries a storage payload contributes to a document.
fn payload_entries(payload: &Value) -> Result<BTreeMap<String, Value>> {
    match payload {
        Value::Null => Ok(BTreeMap::new()),
        Value::Map(map) => Ok(map.clone()),
        Value::String(text) => entries_from_text(text),
        Value::Bytes(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| Error::malformed(format!("payload is not UTF-8: {}", e)))?;
            entries_from_text(text)
        }
        other => Err(Error::malformed(format!(
            "expected null, a map or JSON text, got {}",
            kind(other)
        ))),
    }
}

fn entries_from_text(text: &str) -> Result<BTreeMap<String, Value>> {
    let decoded = from_json_str(text).inspect_err(|e| {
        tracing::warn!(error = %e, "stored document is not valid JSON");
    })?;

    match decoded {
        Value::Null => Ok(BTreeMap::new()),
        Value::Map(map) => Ok(map),
        other => Err(Error::malformed(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Integer(_) | Value::Float(_) => "a number",
        Value::String(_) => "a string",
        Value::Bytes(_) => "bytes",
        Value::Array(_) => "an array",
        Value::Map(_) => "a map",
    }
}
