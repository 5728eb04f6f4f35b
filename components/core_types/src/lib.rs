//! Core JavaScript value types and error handling.
//!
//! This crate provides the dynamically typed values that flow through the
//! promise runtime: fulfillment values, rejection reasons and event payloads.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`Function`] - Host callables; returning `Err` throws
//! - [`JsObject`] - Host objects inspected through property reads
//! - [`JsError`] - JavaScript exceptions
//! - [`ErrorKind`] - Types of JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, JsObject, PlainObject, Value};
//!
//! // Create JavaScript values
//! let num = Value::Smi(42);
//! assert_eq!(num.type_of(), "number");
//!
//! // An object with a callable property
//! let obj = PlainObject::new().with("f", Value::function(|_| Ok(Value::Null)));
//! assert!(obj.get("f").unwrap().as_function().is_some());
//!
//! // Create an error
//! let error = JsError::type_error("undefined is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod function;
mod object;
mod value;

pub use error::{ErrorKind, JsError};
pub use function::{Function, WeakFunction};
pub use object::{JsObject, PlainObject};
pub use value::Value;
