//! JavaScript value representation.
//!
//! This module provides the core `Value` enum that represents every value a
//! promise can be fulfilled or rejected with.

use crate::{Function, JsError, JsObject};
use std::fmt;
use std::rc::Rc;

/// Represents any JavaScript value.
///
/// Primitives are stored inline. Arrays, objects and functions are shared
/// handles: cloning a `Value` never deep-copies them, and equality on them is
/// identity, except for arrays which compare element-wise.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.14);
///
/// assert_eq!(undefined.type_of(), "undefined");
/// assert_eq!(number.type_of(), "number");
/// assert_eq!(float.type_of(), "number");
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// JavaScript undefined value
    #[default]
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(std::string::String),
    /// Immutable ordered list
    Array(Rc<Vec<Value>>),
    /// Error object
    Error(JsError),
    /// Host object
    Object(Rc<dyn JsObject>),
    /// Callable
    Function(Function),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Value::Object(_) => write!(f, "Object(...)"),
            Value::Function(_) => write!(f, "Function(...)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Builds an array value.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    /// Wraps a host object.
    pub fn object<T: JsObject>(object: T) -> Self {
        Value::Object(Rc::new(object))
    }

    /// Wraps a closure as a callable value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, JsError> + 'static,
    {
        Value::Function(Function::new(f))
    }

    /// Returns the callable, if this is one.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the host object, if this is one.
    pub fn as_object(&self) -> Option<&Rc<dyn JsObject>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the JavaScript typeof result for this value.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::Undefined.type_of(), "undefined");
    /// assert_eq!(Value::Null.type_of(), "object");
    /// assert_eq!(Value::Boolean(true).type_of(), "boolean");
    /// assert_eq!(Value::Smi(42).type_of(), "number");
    /// ```
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // JavaScript quirk
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Error(_) | Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<JsError> for Value {
    fn from(e: JsError) -> Self {
        e.into_value()
    }
}

/// Implementation of Display trait for JavaScript string conversion.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Null.to_string(), "null");
/// assert_eq!(Value::Boolean(true).to_string(), "true");
/// assert_eq!(Value::Smi(42).to_string(), "42");
/// assert_eq!(Value::array(vec![Value::Smi(1), Value::Smi(2)]).to_string(), "1,2");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match item {
                        Value::Undefined | Value::Null => {}
                        other => write!(f, "{}", other)?,
                    }
                }
                Ok(())
            }
            Value::Error(e) => write!(f, "{}", e),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(_) => write!(f, "function () {{ [native code] }}"),
        }
    }
}
