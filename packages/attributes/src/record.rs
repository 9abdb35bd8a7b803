//! A host record that owns its dynamic attributes by composition.
//!
//! `DynamicRecord` keeps its raw attributes in a map (standing in for the
//! columns of a database row), holds one [`AttributeResolver`], and calls
//! into it from its own accessors. Real hosts follow the same shape with
//! their own storage behind [`AttributeStore`].

use std::collections::BTreeMap;
use std::sync::Arc;

use dynattr_document::{from_value, to_value, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{
    AttributeResolver, AttributeStore, DynamicConfig, FixedLocale, LocaleProvider, Result,
};

/// A record with raw attributes and a dynamic attribute document.
///
/// # Example
///
/// ```rust
/// use dynattr_attributes::{DynamicConfig, DynamicRecord, SharedLocale};
/// use dynattr_document::Value;
///
/// let config = DynamicConfig::new(["title"]).with_locales(["nl", "en"]);
/// let locale = SharedLocale::new("nl");
/// let mut record = DynamicRecord::new(config, locale.clone());
///
/// record.set("title.nl", "Hallo").unwrap();
/// record.set("title.en", "Hello").unwrap();
///
/// assert_eq!(record.get("title").unwrap(), Value::from("Hallo"));
/// locale.set("en");
/// assert_eq!(record.get("title").unwrap(), Value::from("Hello"));
/// ```
#[derive(Clone, Debug)]
pub struct DynamicRecord<L = FixedLocale> {
    attributes: BTreeMap<String, Value>,
    resolver: AttributeResolver,
    locale: L,
}

impl<L: LocaleProvider> DynamicRecord<L> {
    /// An empty record.
    pub fn new(config: impl Into<Arc<DynamicConfig>>, locale: L) -> Self {
        Self {
            attributes: BTreeMap::new(),
            resolver: AttributeResolver::new(config),
            locale,
        }
    }

    /// A record hydrated from a stored row.
    pub fn from_raw(
        config: impl Into<Arc<DynamicConfig>>,
        locale: L,
        attributes: BTreeMap<String, Value>,
    ) -> Result<Self> {
        let mut record = Self::new(config, locale);
        record.set_raw_attributes(attributes)?;
        Ok(record)
    }

    /// Replace all raw attributes, rebuilding the document from the stored
    /// document column.
    pub fn set_raw_attributes(&mut self, mut attributes: BTreeMap<String, Value>) -> Result<()> {
        self.resolver.hydrate(&mut attributes)?;
        self.attributes = attributes;
        Ok(())
    }

    /// Read an attribute in the active locale.
    pub fn get(&self, name: &str) -> Result<Value> {
        let locale = self.resolver.active_locale(&self.locale);
        self.resolver.get(&self.attributes, name, &locale)
    }

    /// Read an attribute and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        Ok(from_value(self.get(name)?)?)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.resolver.set(&mut self.attributes, name, value.into())
    }

    /// Serialize `value` and store it under `name`.
    pub fn set_as<T: Serialize>(&mut self, name: &str, value: &T) -> Result<()> {
        self.set(name, to_value(value)?)
    }

    /// Mass-assign attributes, skipping names that are not fillable.
    pub fn fill<I, K, V>(&mut self, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in attributes {
            let name = name.as_ref();
            if !self.is_fillable(name) {
                tracing::debug!(attribute = name, "ignoring unfillable attribute");
                continue;
            }
            self.set(name, value)?;
        }
        Ok(())
    }

    /// Dotted names are reserved for nested dynamic attributes; everything
    /// else is fillable.
    pub fn is_fillable(&self, name: &str) -> bool {
        !name.contains('.') || self.resolver.is_nested_dynamic(name)
    }

    pub fn is_dynamic(&self, name: &str) -> bool {
        self.resolver.is_dynamic(name)
    }

    /// Read `name.index` (or `name`) from the document, `Null` if absent.
    pub fn dynamic(&self, name: &str, index: Option<&str>) -> Value {
        self.resolver.dynamic(name, index, Value::Null)
    }

    pub fn dynamic_or(&self, name: &str, index: Option<&str>, default: impl Into<Value>) -> Value {
        self.resolver.dynamic(name, index, default.into())
    }

    pub fn set_dynamic(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        index: Option<&str>,
    ) -> Result<()> {
        self.resolver
            .set_dynamic(&mut self.attributes, name, value.into(), index)
    }

    pub fn remove_dynamic(&mut self, name: &str, index: Option<&str>) -> Result<Option<Value>> {
        self.resolver.remove(&mut self.attributes, name, index)
    }

    /// Pin reads to `locale` regardless of the locale provider.
    pub fn set_active_locale(&mut self, locale: impl Into<String>) {
        self.resolver.set_active_locale(locale);
    }

    pub fn raw_attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// The raw value of a host attribute, bypassing dynamic routing.
    pub fn raw(&self, name: &str) -> Option<Value> {
        self.attributes.get_raw(name)
    }

    pub fn raw_values(&self) -> &Value {
        self.resolver.raw_values()
    }

    pub fn resolver(&self) -> &AttributeResolver {
        &self.resolver
    }
}
