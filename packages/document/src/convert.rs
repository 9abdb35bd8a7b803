//! Conversions between Value, serde types and JSON text.
//!
//! JSON has no bytes and no NaN or infinities. Those leaves are written as
//! single-entry tagged objects and restored on the way back in:
//!
//! - `Bytes` as `{"$bytes": "<standard base64>"}`
//! - a non-finite `Float` as `{"$float": "NaN"}`, `"inf"` or `"-inf"`
//!
//! A map that would itself read back as a tag is wrapped in
//! `{"$map": {...}}`, so any tree decodes to exactly what was encoded.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as Json};

use crate::{Error, Result, Value};

const BYTES_TAG: &str = "$bytes";
const FLOAT_TAG: &str = "$float";
const MAP_TAG: &str = "$map";

/// Convert a Value to a Rust type via serde.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value_to_json(value)).map_err(|e| Error::malformed(e.to_string()))
}

/// Convert a Rust type to a Value via serde.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value> {
    let json = serde_json::to_value(data).map_err(|e| Error::Encode {
        message: e.to_string(),
    })?;
    Ok(json_to_value(json))
}

/// Encode a Value as compact JSON text.
pub fn to_json_string(value: &Value) -> Result<String> {
    serde_json::to_string(&value_to_json(value.clone())).map_err(|e| Error::Encode {
        message: e.to_string(),
    })
}

/// Decode JSON text into a Value.
pub fn from_json_str(text: &str) -> Result<Value> {
    let json: Json = serde_json::from_str(text).map_err(|e| Error::malformed(e.to_string()))?;
    Ok(json_to_value(json))
}

/// Encode a tree as JSON, tagging the leaves JSON cannot carry.
pub fn value_to_json(value: Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(b),
        Value::Integer(i) => Json::from(i),
        Value::Float(f) => match serde_json::Number::from_f64(f) {
            Some(number) => Json::Number(number),
            None => tagged(FLOAT_TAG, Json::String(non_finite_name(f).to_string())),
        },
        Value::String(s) => Json::String(s),
        Value::Bytes(bytes) => tagged(BYTES_TAG, Json::String(BASE64.encode(bytes))),
        Value::Array(items) => Json::Array(items.into_iter().map(value_to_json).collect()),
        Value::Map(map) => {
            let looks_tagged = map.len() == 1 && map.keys().any(|key| is_tag(key));
            let object = Json::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value_to_json(value)))
                    .collect(),
            );
            if looks_tagged {
                tagged(MAP_TAG, object)
            } else {
                object
            }
        }
    }
}

/// Decode JSON into a tree, restoring tagged leaves.
///
/// Numbers that fit `i64` become integers and every other number a float.
/// A tagged object whose payload does not decode is kept as a plain map.
pub fn json_to_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::String(n.to_string()),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().map(json_to_value).collect()),
        Json::Object(object) => object_to_value(object),
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        json_to_value(json)
    }
}

fn is_tag(key: &str) -> bool {
    matches!(key, BYTES_TAG | FLOAT_TAG | MAP_TAG)
}

fn tagged(tag: &str, payload: Json) -> Json {
    let mut object = JsonMap::new();
    object.insert(tag.to_string(), payload);
    Json::Object(object)
}

fn non_finite_name(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}

fn object_to_value(object: JsonMap<String, Json>) -> Value {
    if object.len() != 1 {
        return plain_map(object);
    }
    let Some((key, payload)) = object.into_iter().next() else {
        return Value::map();
    };
    match untag(&key, payload) {
        Ok(value) => value,
        Err(payload) => Value::Map(BTreeMap::from([(key, json_to_value(payload))])),
    }
}

/// The leaf behind a tag, or the payload back if it is not one.
fn untag(tag: &str, payload: Json) -> std::result::Result<Value, Json> {
    match (tag, payload) {
        (BYTES_TAG, Json::String(text)) => match BASE64.decode(&text) {
            Ok(bytes) => Ok(Value::Bytes(bytes)),
            Err(_) => Err(Json::String(text)),
        },
        (FLOAT_TAG, Json::String(text)) => match text.parse::<f64>() {
            Ok(f) if !f.is_finite() => Ok(Value::Float(f)),
            _ => Err(Json::String(text)),
        },
        (MAP_TAG, Json::Object(inner)) => Ok(plain_map(inner)),
        (_, payload) => Err(payload),
    }
}

fn plain_map(object: JsonMap<String, Json>) -> Value {
    Value::Map(
        object
            .into_iter()
            .map(|(key, value)| (key, json_to_value(value)))
            .collect(),
    )
}
