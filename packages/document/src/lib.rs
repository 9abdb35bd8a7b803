//! Dynamic Attributes: Document Layer
//!
//! A path-addressable nested document, the storage format behind dynamic
//! attributes:
//! - `Value`: a closed tree of scalars, sequences and maps
//! - `Path`: dot-separated address into a tree
//! - `PathDocument`: get/set/remove/merge by path, canonical JSON encoding
//!
//! This layer has no notion of locales or attribute names.
//!
//! # Example
//!
//! ```rust
//! use dynattr_document::{PathDocument, Value};
//!
//! let stored = Value::from(r#"{"title":{"nl":"Hallo"}}"#);
//! let mut document = PathDocument::new().merge_payload(&stored).unwrap();
//!
//! document.set("title.en", "Hello");
//! assert_eq!(document.get("title.en"), Some(&Value::from("Hello")));
//! ```

mod convert;
mod document;
mod error;
mod path;
mod value;

pub use convert::{
    from_json_str, from_value, json_to_value, to_json_string, to_value, value_to_json,
};
pub use document::PathDocument;
pub use error::{Error, Result};
pub use path::Path;
pub use value::Value;
