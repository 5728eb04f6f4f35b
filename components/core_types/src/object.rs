//! Host objects.
//!
//! Objects are only ever inspected through property reads, which is all the
//! duck-typed protocols (thenables, emitters, promise markers) need.

use crate::{JsError, Value};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// An object that can be stored in a [`Value::Object`].
///
/// Property reads may run host code (think getters), so [`JsObject::get`]
/// is fallible.
pub trait JsObject: 'static {
    /// Reads a property. Missing properties read as `Undefined`.
    fn get(&self, key: &str) -> Result<Value, JsError>;

    /// Returns true if the object itself (not a prototype) defines `key`.
    fn has_own_property(&self, key: &str) -> bool;

    /// Upcasts to `Any` so engines can recognise their own object types.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// A plain property bag.
///
/// # Examples
///
/// ```
/// use core_types::{JsObject, PlainObject, Value};
///
/// let obj = PlainObject::new().with("answer", Value::Smi(42));
/// assert_eq!(obj.get("answer").unwrap(), Value::Smi(42));
/// assert_eq!(obj.get("missing").unwrap(), Value::Undefined);
/// ```
#[derive(Debug, Default)]
pub struct PlainObject {
    properties: RefCell<Vec<(String, Value)>>,
}

impl PlainObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property definition.
    pub fn with(self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Defines or overwrites a property.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut properties = self.properties.borrow_mut();
        match properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => properties.push((key, value)),
        }
    }
}

impl JsObject for PlainObject {
    fn get(&self, key: &str) -> Result<Value, JsError> {
        Ok(self
            .properties
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Undefined))
    }

    fn has_own_property(&self, key: &str) -> bool {
        self.properties.borrow().iter().any(|(k, _)| k == key)
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
