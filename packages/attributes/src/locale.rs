//! Sources of the current locale.

use std::sync::{Arc, RwLock};

/// Supplies the locale a read resolves against when the resolver has no
/// explicit override.
pub trait LocaleProvider {
    fn current_locale(&self) -> String;
}

/// A locale that never changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedLocale(pub String);

impl FixedLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(locale.into())
    }
}

impl LocaleProvider for FixedLocale {
    fn current_locale(&self) -> String {
        self.0.clone()
    }
}

/// An application-wide locale that can be changed at runtime.
///
/// Clones share the same locale, so one handle can be given to every record
/// while another is used to switch languages.
///
/// ```rust
/// use dynattr_attributes::{LocaleProvider, SharedLocale};
///
/// let app = SharedLocale::new("nl");
/// let for_record = app.clone();
///
/// app.set("en");
/// assert_eq!(for_record.current_locale(), "en");
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedLocale(Arc<RwLock<String>>);

impl SharedLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(locale.into())))
    }

    pub fn set(&self, locale: impl Into<String>) {
        let mut current = self.0.write().unwrap_or_else(|e| e.into_inner());
        *current = locale.into();
    }
}

impl LocaleProvider for SharedLocale {
    fn current_locale(&self) -> String {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl<T: LocaleProvider + ?Sized> LocaleProvider for &T {
    fn current_locale(&self) -> String {
        (**self).current_locale()
    }
}

impl<T: LocaleProvider + ?Sized> LocaleProvider for Arc<T> {
    fn current_locale(&self) -> String {
        self.as_ref().current_locale()
    }
}

impl<T: LocaleProvider + ?Sized> LocaleProvider for Box<T> {
    fn current_locale(&self) -> String {
        self.as_ref().current_locale()
    }
}
