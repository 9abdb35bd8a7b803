//! Per-host configuration of dynamic attributes.
//!
//! Configuration is a plain value object handed to the resolver, usually
//! shared through an `Arc` by every record of one host type. It can be
//! built in code or read from JSON:
//!
//! ```json
//! {
//!   "dynamic_keys": ["title", "customs"],
//!   "document_key": "values",
//!   "locales": ["nl", "en", "fr"],
//!   "fallback_locales": {"nl": "fr", "en": "fr"},
//!   "empty": "null_or_blank"
//! }
//! ```
//!
//! `dynamic_keys` may contain `"*"` to make every attribute dynamic except
//! the document key and the names in `blacklist`. `fallback_locales` is
//! either a map or a single locale that every other locale falls back to.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use dynattr_document::Value;
use serde::Deserialize;

use crate::{Error, Result};

/// The attribute names routed into the document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct DynamicKeys {
    names: BTreeSet<String>,
    wildcard: bool,
}

impl DynamicKeys {
    /// The entry that makes every name dynamic.
    pub const WILDCARD: &'static str = "*";

    /// Every name is dynamic (subject to the blacklist).
    pub fn all() -> Self {
        Self {
            names: BTreeSet::new(),
            wildcard: true,
        }
    }

    /// Only the given names are dynamic. A `"*"` entry turns on the wildcard.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(Into::into).collect()
    }

    /// Whether `name` is listed literally.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }
}

impl<S: Into<String>> FromIterator<S> for DynamicKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut keys = DynamicKeys::default();
        for name in iter {
            let name = name.into();
            if name == Self::WILDCARD {
                keys.wildcard = true;
            } else {
                keys.names.insert(name);
            }
        }
        keys
    }
}

impl From<Vec<String>> for DynamicKeys {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

/// Where a locale falls back to when its value is absent or empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FallbackLocales {
    /// No fallback: a missing locale resolves to null.
    #[default]
    None,
    /// Every locale other than this one falls back to it.
    Single(String),
    /// Explicit locale -> fallback locale pairs.
    Map(BTreeMap<String, String>),
}

impl FallbackLocales {
    /// The next locale in the chain after `locale`, if one is configured.
    pub fn fallback_for(&self, locale: &str) -> Option<&str> {
        match self {
            FallbackLocales::None => None,
            FallbackLocales::Single(fallback) => {
                (fallback != locale).then_some(fallback.as_str())
            }
            FallbackLocales::Map(map) => map.get(locale).map(String::as_str),
        }
    }

    /// Reject a map whose chains loop back on themselves.
    pub fn validate(&self) -> Result<()> {
        let FallbackLocales::Map(map) = self else {
            return Ok(());
        };

        for start in map.keys() {
            let mut visited = HashSet::new();
            let mut chain = Vec::new();
            let mut current = Some(start.as_str());
            while let Some(locale) = current {
                if !visited.insert(locale) {
                    return Err(Error::FallbackCycleDetected {
                        locale: locale.to_string(),
                        chain,
                    });
                }
                chain.push(locale.to_string());
                current = self.fallback_for(locale);
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FallbackLocales {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FallbackLocales::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Decides which stored values count as missing during locale fallback.
///
/// The default treats only `Null` as empty.
#[derive(Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct EmptyPredicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl EmptyPredicate {
    pub fn new(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Only `Null` is empty.
    pub fn null() -> Self {
        Self::new(Value::is_null)
    }

    /// `Null` and blank strings are empty.
    pub fn null_or_blank() -> Self {
        Self::new(|value| match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        })
    }

    /// Nothing is empty: any stored value, `Null` included, stops the chain.
    pub fn never() -> Self {
        Self::new(|_| false)
    }

    pub fn is_empty(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl Default for EmptyPredicate {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for EmptyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EmptyPredicate(..)")
    }
}

impl TryFrom<String> for EmptyPredicate {
    type Error = String;

    fn try_from(name: String) -> std::result::Result<Self, Self::Error> {
        match name.as_str() {
            "null" => Ok(Self::null()),
            "null_or_blank" => Ok(Self::null_or_blank()),
            "never" => Ok(Self::never()),
            other => Err(format!(
                "unknown empty predicate '{}', expected one of: null, null_or_blank, never",
                other
            )),
        }
    }
}

/// Configuration for one kind of host record.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicConfig {
    /// Names routed into the document.
    pub dynamic_keys: DynamicKeys,
    /// Names excluded from the wildcard.
    pub blacklist: BTreeSet<String>,
    /// The host attribute holding the serialized document.
    pub document_key: String,
    /// Keys that mark a map as a locale map.
    pub locales: BTreeSet<String>,
    /// Read-time fallback chain.
    pub fallback_locales: FallbackLocales,
    /// Which values count as missing during fallback.
    pub empty: EmptyPredicate,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            dynamic_keys: DynamicKeys::default(),
            blacklist: BTreeSet::new(),
            document_key: Self::DEFAULT_DOCUMENT_KEY.to_string(),
            locales: BTreeSet::new(),
            fallback_locales: FallbackLocales::None,
            empty: EmptyPredicate::default(),
        }
    }
}

impl DynamicConfig {
    pub const DEFAULT_DOCUMENT_KEY: &'static str = "values";

    /// A configuration making the given names dynamic.
    pub fn new<I, S>(dynamic_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dynamic_keys: DynamicKeys::only(dynamic_keys),
            ..Self::default()
        }
    }

    /// A configuration making every name dynamic.
    pub fn all() -> Self {
        Self {
            dynamic_keys: DynamicKeys::all(),
            ..Self::default()
        }
    }

    /// Replace every setting at once.
    pub fn configure(
        dynamic_keys: DynamicKeys,
        blacklist: BTreeSet<String>,
        locales: BTreeSet<String>,
        fallback_locales: FallbackLocales,
        empty: EmptyPredicate,
    ) -> Result<Self> {
        let config = Self {
            dynamic_keys,
            blacklist,
            locales,
            fallback_locales,
            empty,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.fallback_locales.validate()
    }

    #[must_use]
    pub fn with_blacklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_document_key(mut self, key: impl Into<String>) -> Self {
        self.document_key = key.into();
        self
    }

    #[must_use]
    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    /// Every locale other than `locale` falls back to it.
    #[must_use]
    pub fn with_fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback_locales = FallbackLocales::Single(locale.into());
        self
    }

    #[must_use]
    pub fn with_fallback_locales(mut self, fallback_locales: FallbackLocales) -> Self {
        self.fallback_locales = fallback_locales;
        self
    }

    #[must_use]
    pub fn with_empty_predicate(mut self, empty: EmptyPredicate) -> Self {
        self.empty = empty;
        self
    }

    /// Whether `name` is routed into the document.
    ///
    /// Literal entries always win. Otherwise the wildcard applies to every
    /// name except the document key and the blacklist.
    pub fn is_dynamic(&self, name: &str) -> bool {
        if self.dynamic_keys.contains(name) {
            return true;
        }

        if self.dynamic_keys.is_wildcard() {
            return name != self.document_key && !self.blacklist.contains(name);
        }

        false
    }

    /// Whether `name` is a dotted path under a dynamic attribute, such as
    /// `title.en` when `title` is dynamic.
    pub fn is_nested_dynamic(&self, name: &str) -> bool {
        name.split_once('.')
            .is_some_and(|(head, _)| self.is_dynamic(head))
    }

    /// Whether `value` is a map keyed by at least one configured locale.
    pub fn is_locale_map(&self, value: &Value) -> bool {
        value
            .as_map()
            .is_some_and(|map| map.keys().any(|key| self.locales.contains(key)))
    }
}
