//! Classification step of the resolution procedure.
//!
//! Every candidate handed to `resolve` is probed exactly once and sorted into
//! a [`Resolution`]; the promise then acts on the variant without probing the
//! candidate again.

use crate::promise::Promise;
use crate::signal::{SUBSCRIBE, UNSUBSCRIBE};
use core_types::{Function, JsError, JsObject, Value};
use std::fmt;
use std::rc::Rc;

/// What a resolution candidate turned out to be.
pub enum Resolution {
    /// The promise being resolved.
    SelfReference,
    /// An object with subscribe/unsubscribe capability.
    Emitter(Rc<dyn JsObject>),
    /// A promise created by this engine.
    Native(Promise),
    /// An object with a callable `then`; carries that function.
    ForeignThenable(Function),
    /// Anything else.
    Plain(Value),
}

/// Classifies `candidate` for resolving `target`.
///
/// # Errors
///
/// Returns the exception if reading a probed property throws.
pub fn classify(target: &Promise, candidate: Value) -> Result<Resolution, JsError> {
    let Value::Object(object) = &candidate else {
        return Ok(Resolution::Plain(candidate));
    };

    if let Some(native) = Promise::from_object(object) {
        if native.ptr_eq(target) {
            return Ok(Resolution::SelfReference);
        }
        return Ok(Resolution::Native(native));
    }

    if emitter_capability(object)? {
        return Ok(Resolution::Emitter(object.clone()));
    }

    match object.get("then")? {
        Value::Function(then) => Ok(Resolution::ForeignThenable(then)),
        _ => Ok(Resolution::Plain(candidate)),
    }
}

/// Returns true if the object exposes both callable subscribe and
/// unsubscribe properties.
pub fn emitter_capability(object: &Rc<dyn JsObject>) -> Result<bool, JsError> {
    let subscribe = object.get(SUBSCRIBE)?;
    if subscribe.as_function().is_none() {
        return Ok(false);
    }
    Ok(object.get(UNSUBSCRIBE)?.as_function().is_some())
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::SelfReference => write!(f, "SelfReference"),
            Resolution::Emitter(_) => write!(f, "Emitter(...)"),
            Resolution::Native(p) => f.debug_tuple("Native").field(p).finish(),
            Resolution::ForeignThenable(_) => write!(f, "ForeignThenable(...)"),
            Resolution::Plain(v) => f.debug_tuple("Plain").field(v).finish(),
        }
    }
}
