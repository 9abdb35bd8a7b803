//! Routing of attribute reads and writes into a record's document.
//!
//! The resolver sits between a host record's accessors and the record's
//! [`PathDocument`]. For every attribute name it decides whether the value
//! lives in the document or in the host's own storage, translates the name
//! (and an optional index) into a document path, and on reads shapes locale
//! maps into a single value through the configured fallback chain.
//!
//! # Locale fallback
//!
//! Resolving `(path, locale)` walks the chain one locale at a time:
//!
//! 1. If the document holds a non-empty value at `path.locale`, that is the
//!    result. A present but empty value (per [`EmptyPredicate`]) does not stop
//!    the walk.
//! 2. Otherwise move to the fallback of `locale`. Without one, the walk ends
//!    with the caller's default (`Null` for plain reads).
//!
//! Coming back to a locale already visited is reported as
//! [`Error::FallbackCycleDetected`] instead of looping forever.
//!
//! [`EmptyPredicate`]: crate::EmptyPredicate

use std::sync::Arc;

use dynattr_document::{Path, PathDocument, Value};

use crate::{AttributeStore, DynamicConfig, Error, LocaleProvider, Result};

/// Attribute classification, routing and locale resolution for one record.
#[derive(Clone, Debug)]
pub struct AttributeResolver {
    config: Arc<DynamicConfig>,
    document: PathDocument,
    locale: Option<String>,
}

impl AttributeResolver {
    /// Create a resolver with an empty document.
    pub fn new(config: impl Into<Arc<DynamicConfig>>) -> Self {
        Self {
            config: config.into(),
            document: PathDocument::new(),
            locale: None,
        }
    }

    pub fn config(&self) -> &DynamicConfig {
        &self.config
    }

    /// Swap the configuration. The document is kept as is.
    pub fn configure(&mut self, config: impl Into<Arc<DynamicConfig>>) {
        self.config = config.into();
    }

    /// Resolve reads against `locale` instead of the provider's locale.
    pub fn set_active_locale(&mut self, locale: impl Into<String>) {
        self.locale = Some(locale.into());
    }

    pub fn clear_active_locale(&mut self) {
        self.locale = None;
    }

    /// The explicit override if one is set, otherwise the provider's locale.
    pub fn active_locale<P: LocaleProvider + ?Sized>(&self, provider: &P) -> String {
        match &self.locale {
            Some(locale) => locale.clone(),
            None => provider.current_locale(),
        }
    }

    pub fn is_dynamic(&self, name: &str) -> bool {
        self.config.is_dynamic(name)
    }

    pub fn is_nested_dynamic(&self, name: &str) -> bool {
        self.config.is_nested_dynamic(name)
    }

    /// Whether reads and writes of `name` go to the document.
    pub fn routes_to_document(&self, name: &str) -> bool {
        self.is_dynamic(name) || self.is_nested_dynamic(name)
    }

    pub fn document(&self) -> &PathDocument {
        &self.document
    }

    /// The document's backing tree, for inspection.
    pub fn raw_values(&self) -> &Value {
        self.document.all()
    }

    /// Read `name` as seen from `locale`.
    ///
    /// Names that are not routed to the document come from `host`. A routed
    /// name with a value for `locale` goes through locale fallback; a routed
    /// name holding a locale map without that locale also falls back; any
    /// other stored value is returned unchanged. A routed name the document
    /// knows nothing about is still answered by `host`.
    pub fn get<S: AttributeStore + ?Sized>(
        &self,
        host: &S,
        name: &str,
        locale: &str,
    ) -> Result<Value> {
        if !self.routes_to_document(name) {
            return Ok(host.get_raw(name).unwrap_or_default());
        }

        let path = Path::parse(name);
        if path.is_empty() {
            return Ok(host.get_raw(name).unwrap_or_default());
        }

        if self.document.get_path(&path.child(locale)).is_some() {
            return self.resolve(&path, locale, Value::Null);
        }

        if let Some(value) = self.document.get_path(&path) {
            if self.config.is_locale_map(value) {
                return self.resolve(&path, locale, Value::Null);
            }
            return Ok(value.clone());
        }

        tracing::debug!(attribute = name, "not in document, reading from host");
        Ok(host.get_raw(name).unwrap_or_default())
    }

    /// Read `name.index` (or `name` without an index) straight from the
    /// document. No locale fallback is applied.
    pub fn dynamic(&self, name: &str, index: Option<&str>, default: Value) -> Value {
        indexed(name, index)
            .and_then(|path| self.document.get_path(&path).cloned())
            .unwrap_or(default)
    }

    /// Resolve `name` for `locale` through the fallback chain, returning
    /// `default` once the chain is exhausted.
    pub fn localized(&self, name: &str, locale: &str, default: Value) -> Result<Value> {
        self.resolve(&Path::parse(name), locale, default)
    }

    /// Write `name`.
    ///
    /// A routed name is stored in the document (a dotted name such as
    /// `title.en` writes exactly that path; a plain name replaces whatever
    /// was there, locale map included) and the document is persisted.
    /// Assigning the document key itself replaces the whole document from
    /// the payload. Anything else goes to `host` untouched.
    pub fn set<S: AttributeStore + ?Sized>(
        &mut self,
        host: &mut S,
        name: &str,
        value: Value,
    ) -> Result<()> {
        if self.routes_to_document(name) {
            let path = Path::parse(name);
            if path.is_empty() {
                tracing::debug!(attribute = name, "ignoring write without a path");
                return Ok(());
            }
            self.document.set_path(&path, value);
            return self.persist(host);
        }

        if name == self.config.document_key {
            self.fill_document(&value)?;
            return self.persist(host);
        }

        host.set_raw(name, value);
        Ok(())
    }

    /// Write `name.index` (or `name` without an index) into the document and
    /// persist it, regardless of classification.
    pub fn set_dynamic<S: AttributeStore + ?Sized>(
        &mut self,
        host: &mut S,
        name: &str,
        value: Value,
        index: Option<&str>,
    ) -> Result<()> {
        let Some(path) = indexed(name, index) else {
            tracing::debug!(attribute = name, "ignoring write without a path");
            return Ok(());
        };
        self.document.set_path(&path, value);
        self.persist(host)
    }

    /// Remove `name.index` (or `name`) from the document and persist it.
    ///
    /// Returns the removed value. Removing a missing path is a no-op.
    pub fn remove<S: AttributeStore + ?Sized>(
        &mut self,
        host: &mut S,
        name: &str,
        index: Option<&str>,
    ) -> Result<Option<Value>> {
        let Some(path) = indexed(name, index) else {
            return Ok(None);
        };
        let removed = self.document.remove_path(&path);
        self.persist(host)?;
        Ok(removed)
    }

    /// Replace the document with the contents of a storage payload: `Null`,
    /// a structured map, or serialized JSON text.
    pub fn fill_document(&mut self, payload: &Value) -> Result<()> {
        self.document = PathDocument::new()
            .merge_payload(payload)
            .inspect_err(|e| tracing::warn!(error = %e, "rejecting document payload"))?;
        Ok(())
    }

    /// Hydrate from freshly loaded raw attributes.
    ///
    /// The payload under the document key becomes the document, and the
    /// stored entry is rewritten to the canonical serialized form.
    pub fn hydrate<S: AttributeStore + ?Sized>(&mut self, attributes: &mut S) -> Result<()> {
        let Some(payload) = attributes.get_raw(&self.config.document_key) else {
            return Ok(());
        };
        self.fill_document(&payload)?;
        self.persist(attributes)
    }

    fn persist<S: AttributeStore + ?Sized>(&self, host: &mut S) -> Result<()> {
        let serialized = self.document.serialize()?;
        tracing::debug!(
            key = %self.config.document_key,
            bytes = serialized.len(),
            "persisting document"
        );
        host.set_raw(&self.config.document_key, Value::String(serialized));
        Ok(())
    }

    fn resolve(&self, path: &Path, locale: &str, default: Value) -> Result<Value> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = locale;

        loop {
            if chain.iter().any(|visited| visited == current) {
                tracing::warn!(path = %path, locale = current, "fallback cycle detected");
                return Err(Error::FallbackCycleDetected {
                    locale: current.to_string(),
                    chain,
                });
            }
            chain.push(current.to_string());

            if let Some(value) = self.document.get_path(&path.child(current)) {
                if !self.config.empty.is_empty(value) {
                    return Ok(value.clone());
                }
            }

            match self.config.fallback_locales.fallback_for(current) {
                Some(next) => {
                    tracing::debug!(path = %path, from = current, to = next, "locale fallback");
                    current = next;
                }
                None => return Ok(default),
            }
        }
    }
}

/// `name`, extended by `index` when one is given.
///
/// `None` when either part is blank, so a blank name or index never
/// addresses the document root or the whole attribute.
fn indexed(name: &str, index: Option<&str>) -> Option<Path> {
    let path = Path::parse(name);
    let path = match index {
        Some(index) => {
            let index = Path::parse(index);
            if index.is_empty() {
                return None;
            }
            path.join(&index)
        }
        None => path,
    };
    (!path.is_empty()).then_some(path)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::EmptyPredicate;
    use collection_literals::btree;

    fn localized_config() -> DynamicConfig {
        DynamicConfig::new(["title", "customs"]).with_locales(["nl", "en", "fr", "de"])
    }

    fn resolver_with(config: DynamicConfig, values: Value) -> AttributeResolver {
        let mut resolver = AttributeResolver::new(config);
        resolver.fill_document(&values).unwrap();
        resolver
    }

    fn host() -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    fn title(entries: BTreeMap<String, Value>) -> Value {
        Value::Map(btree! { "title".to_string() => Value::Map(entries) })
    }

    #[test]
    fn static_attribute_comes_from_host() {
        let resolver = AttributeResolver::new(localized_config());
        let host = BTreeMap::from([("content".to_string(), Value::from("body"))]);

        assert_eq!(resolver.get(&host, "content", "nl").unwrap(), Value::from("body"));
        assert_eq!(resolver.get(&host, "missing", "nl").unwrap(), Value::Null);
    }

    #[test]
    fn exact_locale_is_returned() {
        let resolver = resolver_with(
            localized_config(),
            title(btree! {
                "nl".to_string() => Value::from("A"),
                "en".to_string() => Value::from("B"),
            }),
        );
        let host = host();

        assert_eq!(resolver.get(&host, "title", "nl").unwrap(), Value::from("A"));
        assert_eq!(resolver.get(&host, "title", "en").unwrap(), Value::from("B"));
    }

    #[test]
    fn missing_locale_falls_back() {
        let config = localized_config()
            .with_fallback_locales([("en", "nl")].into_iter().collect());
        let resolver = resolver_with(
            config,
            title(btree! { "nl".to_string() => Value::from("T-nl") }),
        );

        let host = host();
        assert_eq!(resolver.get(&host, "title", "en").unwrap(), Value::from("T-nl"));
    }

    #[test]
    fn missing_locale_without_fallback_is_null() {
        let resolver = resolver_with(
            localized_config(),
            title(btree! { "nl".to_string() => Value::from("T-nl") }),
        );

        let host = host();
        assert_eq!(resolver.get(&host, "title", "en").unwrap(), Value::Null);
    }

    #[test]
    fn null_value_falls_back_by_default() {
        let config = localized_config().with_fallback("nl");
        let resolver = resolver_with(
            config,
            title(btree! {
                "nl".to_string() => Value::from("T-nl"),
                "en".to_string() => Value::Null,
            }),
        );

        let host = host();
        assert_eq!(resolver.get(&host, "title", "en").unwrap(), Value::from("T-nl"));
    }

    #[test]
    fn null_value_is_kept_when_predicate_says_so() {
        let config = localized_config()
            .with_fallback("nl")
            .with_empty_predicate(EmptyPredicate::never());
        let resolver = resolver_with(
            config,
            title(btree! {
                "nl".to_string() => Value::from("T-nl"),
                "en".to_string() => Value::Null,
            }),
        );

        let host = host();
        assert_eq!(resolver.get(&host, "title", "en").unwrap(), Value::Null);
    }

    #[test]
    fn blank_string_falls_back_with_blank_predicate() {
        let values = title(btree! {
            "nl".to_string() => Value::from("T-nl"),
            "en".to_string() => Value::from(""),
        });
        let host = host();

        let strict = resolver_with(localized_config().with_fallback("nl"), values.clone());
        assert_eq!(strict.get(&host, "title", "en").unwrap(), Value::from(""));

        let lenient = resolver_with(
            localized_config()
                .with_fallback("nl")
                .with_empty_predicate(EmptyPredicate::null_or_blank()),
            values,
        );
        assert_eq!(lenient.get(&host, "title", "en").unwrap(), Value::from("T-nl"));
    }

    #[test]
    fn fallback_chain_is_walked() {
        let config = localized_config().with_fallback_locales(
            [("nl", "fr"), ("en", "fr"), ("de", "nl")].into_iter().collect(),
        );
        let resolver = resolver_with(
            config,
            title(btree! { "fr".to_string() => Value::from("T-fr") }),
        );

        let host = host();
        assert_eq!(resolver.get(&host, "title", "de").unwrap(), Value::from("T-fr"));
    }

    #[test]
    fn fallback_cycle_is_an_error() {
        // Built without validation to exercise the runtime guard.
        let mut config = localized_config();
        config.fallback_locales = [("en", "nl"), ("nl", "en")].into_iter().collect();
        let resolver = resolver_with(
            config,
            title(btree! {
                "fr".to_string() => Value::from("T-fr"),
            }),
        );

        let host = host();
        let err = resolver.get(&host, "title", "en").unwrap_err();
        match err {
            Error::FallbackCycleDetected { locale, chain } => {
                assert_eq!(locale, "en");
                assert_eq!(chain, vec!["en".to_string(), "nl".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn plain_nested_value_is_returned_as_is() {
        let resolver = resolver_with(
            localized_config(),
            Value::Map(btree! {
                "customs".to_string() => Value::from(vec!["first custom", "second custom"]),
            }),
        );

        let host = host();
        assert_eq!(
            resolver.get(&host, "customs", "nl").unwrap(),
            Value::from(vec!["first custom", "second custom"])
        );
    }

    #[test]
    fn unpopulated_dynamic_attribute_reads_host() {
        let resolver = AttributeResolver::new(localized_config());
        let host = BTreeMap::from([("title".to_string(), Value::from("column title"))]);

        assert_eq!(
            resolver.get(&host, "title", "nl").unwrap(),
            Value::from("column title")
        );
    }

    #[test]
    fn nested_dynamic_read() {
        let resolver = resolver_with(
            localized_config(),
            title(btree! { "en".to_string() => Value::from("B") }),
        );

        let host = host();
        assert_eq!(resolver.get(&host, "title.en", "nl").unwrap(), Value::from("B"));
        assert_eq!(resolver.get(&host, "title.fr", "nl").unwrap(), Value::Null);
    }

    #[test]
    fn explicit_index_skips_fallback() {
        let config = localized_config().with_fallback("nl");
        let resolver = resolver_with(
            config,
            title(btree! { "nl".to_string() => Value::from("T-nl") }),
        );

        assert_eq!(
            resolver.dynamic("title", Some("nl"), Value::Null),
            Value::from("T-nl")
        );
        assert_eq!(
            resolver.dynamic("title", Some("en"), Value::from("title default")),
            Value::from("title default")
        );
        assert_eq!(
            resolver.localized("title", "en", Value::from("title default")).unwrap(),
            Value::from("T-nl")
        );
        assert_eq!(
            resolver.localized("title", "es", Value::from("none")).unwrap(),
            Value::from("T-nl")
        );
    }

    #[test]
    fn localized_default_when_chain_exhausted() {
        let resolver = resolver_with(
            localized_config(),
            title(btree! { "nl".to_string() => Value::from("T-nl") }),
        );
        assert_eq!(
            resolver.localized("title", "en", Value::from("title default")).unwrap(),
            Value::from("title default")
        );
    }

    #[test]
    fn set_routes_and_persists() {
        let mut resolver = AttributeResolver::new(localized_config());
        let mut host = host();

        resolver.set(&mut host, "title.nl", Value::from("A")).unwrap();
        resolver.set(&mut host, "title.en", Value::from("B")).unwrap();
        resolver.set(&mut host, "content", Value::from("body")).unwrap();

        assert_eq!(
            resolver.raw_values().get(&Path::parse("title")),
            Some(&Value::Map(btree! {
                "nl".to_string() => Value::from("A"),
                "en".to_string() => Value::from("B"),
            }))
        );
        assert_eq!(
            host.get("values"),
            Some(&Value::from(r#"{"title":{"en":"B","nl":"A"}}"#))
        );
        assert_eq!(host.get("content"), Some(&Value::from("body")));
        assert_eq!(resolver.get(&host, "title", "nl").unwrap(), Value::from("A"));
    }

    #[test]
    fn plain_set_replaces_locale_map() {
        let mut resolver = resolver_with(
            localized_config(),
            title(btree! { "nl".to_string() => Value::from("A") }),
        );
        let mut host = host();

        resolver.set(&mut host, "title", Value::from("plain")).unwrap();
        assert_eq!(resolver.get(&host, "title", "nl").unwrap(), Value::from("plain"));
    }

    #[test]
    fn assigning_document_key_replaces_document() {
        let mut resolver = resolver_with(
            localized_config(),
            title(btree! { "nl".to_string() => Value::from("old") }),
        );
        let mut host = host();

        resolver
            .set(&mut host, "values", Value::from(r#"{"customs":[1,2]}"#))
            .unwrap();

        assert!(!resolver.document().has("title"));
        assert_eq!(
            resolver.dynamic("customs", None, Value::Null),
            Value::from(vec![1, 2])
        );
        assert_eq!(host.get("values"), Some(&Value::from(r#"{"customs":[1,2]}"#)));
    }

    #[test]
    fn assigning_malformed_document_fails_and_keeps_state() {
        let mut resolver = resolver_with(
            localized_config(),
            title(btree! { "nl".to_string() => Value::from("kept") }),
        );
        let mut host = host();

        let err = resolver
            .set(&mut host, "values", Value::from("{corrupt"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Document(dynattr_document::Error::MalformedDocumentPayload { .. })
        ));
        assert!(host.is_empty());
        assert!(resolver.document().has("title.nl"));
    }

    #[test]
    fn set_dynamic_and_remove_with_index() {
        let mut resolver = AttributeResolver::new(localized_config());
        let mut host = host();

        resolver
            .set_dynamic(&mut host, "title", Value::from("nl title"), Some("nl"))
            .unwrap();
        resolver
            .set_dynamic(&mut host, "title", Value::from("en title"), Some("en"))
            .unwrap();

        let removed = resolver.remove(&mut host, "title", Some("nl")).unwrap();
        assert_eq!(removed, Some(Value::from("nl title")));
        assert!(!resolver.document().has("title.nl"));
        assert_eq!(host.get("values"), Some(&Value::from(r#"{"title":{"en":"en title"}}"#)));

        assert_eq!(resolver.remove(&mut host, "title.fr", None).unwrap(), None);
    }

    #[test]
    fn blank_names_and_indexes_address_nothing() {
        let mut resolver = AttributeResolver::new(DynamicConfig::all());
        let mut host = host();
        resolver.set(&mut host, "title.nl", Value::from("A")).unwrap();
        let stored = host.get("values").cloned();

        resolver.set(&mut host, "", Value::from("x")).unwrap();
        resolver
            .set_dynamic(&mut host, "title", Value::from("x"), Some(""))
            .unwrap();
        assert_eq!(resolver.remove(&mut host, "", None).unwrap(), None);
        assert_eq!(resolver.remove(&mut host, "title", Some(".")).unwrap(), None);

        assert_eq!(host.get("values"), stored.as_ref());
        assert_eq!(resolver.dynamic("title", Some(""), Value::Null), Value::Null);
        assert_eq!(resolver.dynamic("title.nl", None, Value::Null), Value::from("A"));

        let mut reloaded = AttributeResolver::new(DynamicConfig::all());
        reloaded.hydrate(&mut host).unwrap();
        assert_eq!(reloaded.raw_values(), resolver.raw_values());
    }

    #[test]
    fn hydrate_canonicalizes_document_column() {
        let mut resolver = AttributeResolver::new(localized_config());
        let mut attributes = BTreeMap::from([
            ("id".to_string(), Value::from(1)),
            (
                "values".to_string(),
                Value::from(r#"{ "title" : { "nl" : "titel" } }"#),
            ),
        ]);

        resolver.hydrate(&mut attributes).unwrap();

        assert_eq!(
            attributes.get("values"),
            Some(&Value::from(r#"{"title":{"nl":"titel"}}"#))
        );
        assert_eq!(
            resolver.get(&attributes, "title", "nl").unwrap(),
            Value::from("titel")
        );
    }

    #[test]
    fn hydrate_without_document_column_is_noop() {
        let mut resolver = AttributeResolver::new(localized_config());
        let mut attributes = BTreeMap::from([("id".to_string(), Value::from(1))]);

        resolver.hydrate(&mut attributes).unwrap();
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn active_locale_override() {
        let mut resolver = AttributeResolver::new(localized_config());
        let provider = crate::FixedLocale::new("nl");

        assert_eq!(resolver.active_locale(&provider), "nl");
        resolver.set_active_locale("en");
        assert_eq!(resolver.active_locale(&provider), "en");
        resolver.clear_active_locale();
        assert_eq!(resolver.active_locale(&provider), "nl");
    }

    #[test]
    fn configure_swaps_rules() {
        let mut resolver = AttributeResolver::new(localized_config());
        assert!(!resolver.is_dynamic("content"));

        resolver.configure(DynamicConfig::all().with_blacklist(["title"]));
        assert!(resolver.is_dynamic("content"));
        assert!(!resolver.is_dynamic("title"));
        assert!(resolver.routes_to_document("content.en"));
    }
}
