//! Dynamic Attributes: Resolution Layer
//!
//! Lets a host record expose attributes that live inside one serialized
//! document column instead of their own columns.
//!
//! - `DynamicConfig`: which names are dynamic, the locales, their fallbacks
//! - `AttributeResolver`: classifies names, routes reads and writes, and
//!   walks locale fallback chains
//! - `AttributeStore`: the host's raw attribute storage
//! - `LocaleProvider`: where the current locale comes from
//! - `DynamicRecord`: a ready-made host built from the pieces above
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//!
//! use dynattr_attributes::{AttributeResolver, DynamicConfig};
//! use dynattr_document::Value;
//!
//! let config = DynamicConfig::new(["title"])
//!     .with_locales(["nl", "en"])
//!     .with_fallback("nl");
//! let mut resolver = AttributeResolver::new(config);
//! let mut row: BTreeMap<String, Value> = BTreeMap::new();
//!
//! resolver.set(&mut row, "title.nl", Value::from("Hallo")).unwrap();
//!
//! assert_eq!(resolver.get(&row, "title", "en").unwrap(), Value::from("Hallo"));
//! assert_eq!(row["values"], Value::from(r#"{"title":{"nl":"Hallo"}}"#));
//! ```

mod config;
mod error;
mod locale;
mod record;
mod resolver;
mod storage;

pub use config::{DynamicConfig, DynamicKeys, EmptyPredicate, FallbackLocales};
pub use error::{Error, Result};
pub use locale::{FixedLocale, LocaleProvider, SharedLocale};
pub use record::DynamicRecord;
pub use resolver::AttributeResolver;
pub use storage::AttributeStore;

pub use dynattr_document::{Path, PathDocument, Value};
