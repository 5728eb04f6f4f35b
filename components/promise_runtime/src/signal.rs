//! Emitters and the adapter that turns one emission into a promise.
//!
//! An emitter is any object whose `connect` and `disconnect` properties are
//! callable. [`Signal`] is the engine's own emitter, handy for feeding host
//! events into promises; [`adapt`] works with any emitter.

use crate::error::subscription_error;
use crate::promise::Promise;
use crate::runtime::Runtime;
use core_types::{Function, JsError, JsObject, Value, WeakFunction};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Property name of an emitter's subscribe function.
pub const SUBSCRIBE: &str = "connect";

/// Property name of an emitter's unsubscribe function.
pub const UNSUBSCRIBE: &str = "disconnect";

/// Wraps an emitter into a one-shot promise.
///
/// The returned promise fulfills with the payload of the first emission
/// after this call, bundled as an array of the emitted arguments. The
/// handler then disconnects itself; a failing `disconnect` is logged.
///
/// # Errors
///
/// Fails if the emitter's capabilities cannot be read or its subscribe call
/// throws. Nothing is subscribed in that case.
pub fn adapt(runtime: &Runtime, emitter: &Rc<dyn JsObject>) -> Result<Promise, JsError> {
    let subscribe = capability(emitter, SUBSCRIBE)?;
    capability(emitter, UNSUBSCRIBE)?;

    let intermediary = runtime.pending();
    // Filled once the handler exists; emptied by the first emission.
    let this: Rc<RefCell<Option<WeakFunction>>> = Rc::new(RefCell::new(None));
    let handler = {
        let promise = intermediary.clone();
        let this = this.clone();
        let emitter = Rc::downgrade(emitter);
        Function::new(move |args| {
            let Some(handler) = this.borrow_mut().take() else {
                return Ok(Value::Undefined);
            };
            promise.resolve_or_reject(Value::array(args));
            if let (Some(handler), Some(emitter)) = (handler.upgrade(), emitter.upgrade()) {
                unsubscribe(&emitter, handler);
            }
            Ok(Value::Undefined)
        })
    };
    *this.borrow_mut() = Some(handler.downgrade());

    subscribe
        .call(vec![handler.into()])
        .map_err(subscription_error)?;
    debug!("subscribed to emitter");
    Ok(intermediary)
}

fn capability(emitter: &Rc<dyn JsObject>, key: &str) -> Result<Function, JsError> {
    match emitter.get(key)? {
        Value::Function(f) => Ok(f),
        other => Err(JsError::type_error(format!(
            "emitter.{key} is not a function (got {})",
            other.type_of()
        ))),
    }
}

fn unsubscribe(emitter: &Rc<dyn JsObject>, handler: Function) {
    match capability(emitter, UNSUBSCRIBE).and_then(|f| f.call(vec![handler.into()])) {
        Ok(_) => debug!("disconnected from emitter after first emission"),
        Err(error) => warn!(%error, "failed to disconnect from emitter"),
    }
}

struct SignalInner {
    this: Weak<SignalInner>,
    handlers: RefCell<Vec<Function>>,
}

/// A host-side emitter.
///
/// Handlers are called in connection order. Emitting works on a snapshot of
/// the handler list, so handlers may connect or disconnect while an emission
/// is in progress.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use promise_runtime::{Runtime, Signal};
///
/// let (runtime, event_loop) = Runtime::with_event_loop();
/// let signal = Signal::new();
/// let promise = runtime.resolved(signal.clone().into());
///
/// signal.emit(vec![Value::Smi(1)]).unwrap();
/// event_loop.run_until_idle().unwrap();
/// assert_eq!(promise.result(), Some(Value::array(vec![Value::Smi(1)])));
/// ```
#[derive(Clone)]
pub struct Signal {
    inner: Rc<SignalInner>,
}

impl Signal {
    /// Creates a signal with no handlers.
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|this| SignalInner {
            this: this.clone(),
            handlers: RefCell::new(Vec::new()),
        });
        Self { inner }
    }

    /// Connects a handler.
    pub fn connect(&self, handler: Function) {
        self.inner.handlers.borrow_mut().push(handler);
    }

    /// Disconnects a handler. Returns false if it was not connected.
    pub fn disconnect(&self, handler: &Function) -> bool {
        let mut handlers = self.inner.handlers.borrow_mut();
        match handlers.iter().position(|h| h.ptr_eq(handler)) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the number of connected handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Calls every connected handler with `args`.
    ///
    /// Every handler runs even if an earlier one throws; the first failure
    /// is returned.
    pub fn emit(&self, args: Vec<Value>) -> Result<(), JsError> {
        let handlers = self.inner.handlers.borrow().clone();
        let mut first_error = None;
        for handler in handlers {
            if let Err(error) = handler.call(args.clone()) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl From<Signal> for Value {
    fn from(signal: Signal) -> Self {
        Value::Object(signal.inner)
    }
}

fn handler_arg(args: Vec<Value>) -> Result<Function, JsError> {
    match args.into_iter().next() {
        Some(Value::Function(f)) => Ok(f),
        _ => Err(JsError::type_error("signal handler must be a function")),
    }
}

impl JsObject for SignalInner {
    fn get(&self, key: &str) -> Result<Value, JsError> {
        let Some(inner) = self.this.upgrade() else {
            return Ok(Value::Undefined);
        };
        let signal = Signal { inner };
        Ok(match key {
            SUBSCRIBE => Value::function(move |args| {
                signal.connect(handler_arg(args)?);
                Ok(Value::Undefined)
            }),
            UNSUBSCRIBE => Value::function(move |args| {
                let handler = handler_arg(args)?;
                Ok(Value::Boolean(signal.disconnect(&handler)))
            }),
            _ => Value::Undefined,
        })
    }

    fn has_own_property(&self, key: &str) -> bool {
        matches!(key, SUBSCRIBE | UNSUBSCRIBE)
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
