//! JavaScript error types and error handling.
//!
//! A [`JsError`] is what a host callable returns to "throw". Anything can be
//! thrown, so an error either describes itself (kind + message) or carries the
//! thrown [`Value`] verbatim.

use crate::Value;
use std::fmt;
use thiserror::Error;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors, plus
/// [`ErrorKind::Throw`] for arbitrary thrown values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Type error (e.g., resolving a promise with itself)
    TypeError,
    /// Internal engine error
    InternalError,
    /// A non-error value thrown as-is
    Throw,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::Throw => "Uncaught",
        };
        f.write_str(name)
    }
}

/// A JavaScript exception.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError, Value};
///
/// let error = JsError::type_error("undefined is not a function");
/// assert_eq!(error.kind, ErrorKind::TypeError);
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
///
/// // Throwing a plain value keeps the value intact.
/// let thrown = JsError::throw(Value::from("e"));
/// assert_eq!(thrown.into_value(), Value::from("e"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The thrown value, when something other than an error object was thrown
    pub thrown: Option<Box<Value>>,
}

impl JsError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            thrown: None,
        }
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates an `InternalError`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Throws an arbitrary value.
    pub fn throw(value: Value) -> Self {
        Self {
            kind: ErrorKind::Throw,
            message: value.to_string(),
            thrown: Some(Box::new(value)),
        }
    }

    /// Converts the exception into the value observed by a catch handler.
    pub fn into_value(self) -> Value {
        match self.thrown {
            Some(value) => *value,
            None => Value::Error(self),
        }
    }
}
