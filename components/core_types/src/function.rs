//! Host callables.

use crate::{JsError, Value};
use std::fmt;
use std::rc::{Rc, Weak};

/// A function that can be called with arguments and returns a Result.
///
/// Returning `Err` is how a function throws. Functions are cheap to clone;
/// clones share the same underlying closure and compare equal.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
///
/// let double = Function::new(|args| match args.first() {
///     Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
///     _ => Ok(Value::Undefined),
/// });
/// assert_eq!(double.call(vec![Value::Smi(21)]).unwrap(), Value::Smi(42));
/// ```
#[derive(Clone)]
pub struct Function {
    callback: Rc<dyn Fn(Vec<Value>) -> Result<Value, JsError>>,
}

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, JsError> + 'static,
    {
        Self {
            callback: Rc::new(f),
        }
    }

    /// Calls the function with the given arguments.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, JsError> {
        (self.callback)(args)
    }

    /// Returns true if both handles refer to the same closure.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }

    /// Creates a handle that does not keep the closure alive.
    pub fn downgrade(&self) -> WeakFunction {
        WeakFunction {
            callback: Rc::downgrade(&self.callback),
        }
    }
}

/// A non-owning [`Function`] handle.
///
/// Lets a closure refer to the function that wraps it without forming a
/// reference cycle.
#[derive(Clone)]
pub struct WeakFunction {
    callback: Weak<dyn Fn(Vec<Value>) -> Result<Value, JsError>>,
}

impl WeakFunction {
    /// Returns the function if it is still alive.
    pub fn upgrade(&self) -> Option<Function> {
        self.callback.upgrade().map(|callback| Function { callback })
    }
}

impl fmt::Debug for WeakFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakFunction {{ ... }}")
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}
