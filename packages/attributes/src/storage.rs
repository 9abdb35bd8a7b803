//! The host-storage seam.

use std::collections::{BTreeMap, HashMap};

use dynattr_document::Value;

/// Raw attribute storage of a host record, bypassing dynamic routing.
///
/// The resolver reads through this when an attribute is not dynamic (or is
/// dynamic but was never populated), and writes the serialized document
/// back through it after every mutation.
pub trait AttributeStore {
    /// The raw value of `name`, or `None` if the host has no such attribute.
    fn get_raw(&self, name: &str) -> Option<Value>;

    /// Overwrite the raw value of `name`.
    fn set_raw(&mut self, name: &str, value: Value);
}

impl AttributeStore for BTreeMap<String, Value> {
    fn get_raw(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn set_raw(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }
}

impl AttributeStore for HashMap<String, Value> {
    fn get_raw(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn set_raw(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }
}

// Blanket implementations for references and boxes

impl<T: AttributeStore + ?Sized> AttributeStore for &mut T {
    fn get_raw(&self, name: &str) -> Option<Value> {
        (**self).get_raw(name)
    }

    fn set_raw(&mut self, name: &str, value: Value) {
        (**self).set_raw(name, value)
    }
}

impl<T: AttributeStore + ?Sized> AttributeStore for Box<T> {
    fn get_raw(&self, name: &str) -> Option<Value> {
        self.as_ref().get_raw(name)
    }

    fn set_raw(&mut self, name: &str, value: Value) {
        self.as_mut().set_raw(name, value)
    }
}
