//! Promise implementation following the Promise/A+ specification.
//!
//! A [`Promise`] is a shared handle to a single-threaded state machine. Every
//! state transition and every reaction runs on a task queued through the
//! runtime's [`Scheduler`](crate::Scheduler), so a reaction never runs inside
//! the call that registered it or the call that settled its promise.

use crate::diagnostics::FailureKind;
use crate::error::self_resolution_error;
use crate::resolution::{self, Resolution};
use crate::runtime::Runtime;
use crate::signal;
use core_types::{Function, JsError, JsObject, Value};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Marker property carried by every promise this engine creates.
///
/// Recognition goes through the marker rather than type identity so that
/// promises from another engine instance are still recognised.
pub const PROMISE_SIGNATURE: &str = "___promiseSignature___";

/// Marker carried by declarative promise items.
pub const PROMISE_ITEM_SIGNATURE: &str = "___promiseQmlSignature71237___";

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

impl PromiseState {
    fn as_str(self) -> &'static str {
        match self {
            PromiseState::Pending => "pending",
            PromiseState::Fulfilled => "fulfilled",
            PromiseState::Rejected => "rejected",
        }
    }
}

type Reaction = Box<dyn FnOnce(Value)>;

struct PromiseRecord {
    state: PromiseState,
    result: Value,
    // Set by the first accepted public resolve/reject.
    locked: bool,
    fulfill_reactions: Vec<Reaction>,
    reject_reactions: Vec<Reaction>,
}

pub(crate) struct PromiseCell {
    runtime: Runtime,
    this: Weak<PromiseCell>,
    record: RefCell<PromiseRecord>,
}

/// A JavaScript Promise.
///
/// Cloning a `Promise` clones the handle; all clones observe the same state.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use promise_runtime::{PromiseState, Runtime};
///
/// let (runtime, event_loop) = Runtime::with_event_loop();
/// let promise = runtime.pending();
/// promise.resolve(Value::Smi(42)).unwrap();
///
/// // Settlement happens on a later turn.
/// assert_eq!(promise.state(), PromiseState::Pending);
/// event_loop.run_until_idle().unwrap();
/// assert_eq!(promise.state(), PromiseState::Fulfilled);
/// assert_eq!(promise.result(), Some(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Promise {
    cell: Rc<PromiseCell>,
}

impl Promise {
    /// Creates a new pending Promise owned by `runtime`.
    pub fn new(runtime: &Runtime) -> Self {
        let cell = Rc::new_cyclic(|this| PromiseCell {
            runtime: runtime.clone(),
            this: this.clone(),
            record: RefCell::new(PromiseRecord {
                state: PromiseState::Pending,
                result: Value::Undefined,
                locked: false,
                fulfill_reactions: Vec::new(),
                reject_reactions: Vec::new(),
            }),
        });
        Self { cell }
    }

    /// Creates a promise that is fulfilled from the start.
    ///
    /// Only safe where no reaction can exist yet, which holds for a value
    /// nobody else has seen.
    pub(crate) fn fulfilled_now(runtime: &Runtime, value: Value) -> Self {
        let promise = Self::new(runtime);
        {
            let mut record = promise.cell.record.borrow_mut();
            record.state = PromiseState::Fulfilled;
            record.result = value;
            record.locked = true;
        }
        promise
    }

    /// Recovers the promise behind a value created by this engine.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().and_then(Self::from_object)
    }

    pub(crate) fn from_object(object: &Rc<dyn JsObject>) -> Option<Self> {
        object
            .clone()
            .into_any()
            .downcast::<PromiseCell>()
            .ok()
            .map(|cell| Self { cell })
    }

    /// Returns the runtime this promise schedules on.
    pub fn runtime(&self) -> &Runtime {
        &self.cell.runtime
    }

    /// Returns the current state.
    pub fn state(&self) -> PromiseState {
        self.cell.record.borrow().state
    }

    /// Returns the fulfillment value or rejection reason once settled.
    pub fn result(&self) -> Option<Value> {
        let record = self.cell.record.borrow();
        match record.state {
            PromiseState::Pending => None,
            _ => Some(record.result.clone()),
        }
    }

    /// Returns true once the state has left `Pending`.
    pub fn is_settled(&self) -> bool {
        self.state() != PromiseState::Pending
    }

    /// Returns true if the promise was fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        self.state() == PromiseState::Fulfilled
    }

    /// Returns true if the promise was rejected.
    pub fn is_rejected(&self) -> bool {
        self.state() == PromiseState::Rejected
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Resolves the Promise with a value.
    ///
    /// No-op if the promise is settled or a previous `resolve`/`reject` was
    /// accepted. Thenables, emitters and other promises are adopted; any other
    /// value fulfills the promise on a later turn.
    ///
    /// # Errors
    ///
    /// Returns the failure if `value` is an emitter that refused the
    /// subscription. The promise is left untouched in that case, so the
    /// caller may still reject it.
    pub fn resolve(&self, value: Value) -> Result<(), JsError> {
        if !self.try_lock() {
            return Ok(());
        }
        self.resolve_unlocked(value).inspect_err(|_| self.unlock())
    }

    /// Rejects the Promise with a reason.
    ///
    /// No-op if the promise is settled or a previous `resolve`/`reject` was
    /// accepted. If `reason` is an emitter, the rejection waits for its first
    /// emission and uses that payload as the reason.
    ///
    /// # Errors
    ///
    /// Returns the failure if `reason` is an emitter that refused the
    /// subscription.
    pub fn reject(&self, reason: Value) -> Result<(), JsError> {
        if !self.try_lock() {
            return Ok(());
        }
        self.reject_unlocked(reason).inspect_err(|_| self.unlock())
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns a new Promise resolved with whatever the invoked handler
    /// returns, or rejected with what it throws. A missing handler passes the
    /// value or reason through. Handlers always run on a later turn, even
    /// when this promise is already settled.
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
        let derived = Promise::new(self.runtime());
        let on_value = derived.clone();
        let on_reason = derived.clone();
        self.react(
            move |value| match on_fulfilled {
                Some(handler) => on_value.settle_with(handler.call(vec![value])),
                None => on_value.resolve_or_reject(value),
            },
            move |reason| match on_rejected {
                Some(handler) => on_reason.settle_with(handler.call(vec![reason])),
                None => on_reason.reject_or_report(reason),
            },
        );
        derived
    }

    /// Registers internal reactions without creating a derived promise.
    pub(crate) fn react<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(Value) + 'static,
        R: FnOnce(Value) + 'static,
    {
        let settled = {
            let mut record = self.cell.record.borrow_mut();
            record.fulfill_reactions.push(Box::new(on_fulfilled));
            record.reject_reactions.push(Box::new(on_rejected));
            record.state != PromiseState::Pending
        };
        if settled {
            let promise = self.clone();
            self.runtime().schedule(move || promise.execute_reactions());
        }
    }

    /// Resolves, and if the candidate cannot be attached to, rejects with the
    /// attachment failure instead.
    pub(crate) fn resolve_or_reject(&self, value: Value) {
        if let Err(error) = self.resolve(value) {
            self.report(FailureKind::Adoption, &error);
            self.reject_or_report(error.into_value());
        }
    }

    /// Rejects, falling back to the attachment failure as the reason.
    pub(crate) fn reject_or_report(&self, reason: Value) {
        if let Err(error) = self.reject(reason) {
            self.report(FailureKind::Adoption, &error);
            if self.try_lock() {
                self.schedule_rejection(error.into_value());
            }
        }
    }

    fn settle_with(&self, outcome: Result<Value, JsError>) {
        match outcome {
            Ok(value) => self.resolve_or_reject(value),
            Err(error) => {
                self.report(FailureKind::Reaction, &error);
                self.reject_or_report(error.into_value());
            }
        }
    }

    fn try_lock(&self) -> bool {
        let mut record = self.cell.record.borrow_mut();
        if record.state != PromiseState::Pending || record.locked {
            return false;
        }
        record.locked = true;
        true
    }

    fn unlock(&self) {
        self.cell.record.borrow_mut().locked = false;
    }

    /// The resolution procedure, minus the public one-shot latch.
    pub(crate) fn resolve_unlocked(&self, value: Value) -> Result<(), JsError> {
        if self.is_settled() {
            return Ok(());
        }
        match resolution::classify(self, value) {
            Err(error) => {
                self.report(FailureKind::Adoption, &error);
                self.schedule_rejection(error.into_value());
            }
            Ok(Resolution::SelfReference) => {
                let error = self_resolution_error();
                self.report(FailureKind::SelfResolution, &error);
                self.schedule_rejection(error.into_value());
            }
            Ok(Resolution::Emitter(emitter)) => {
                let intermediary = signal::adapt(self.runtime(), &emitter)?;
                return self.resolve_unlocked(intermediary.into());
            }
            Ok(Resolution::Native(other)) => self.adopt(&other),
            Ok(Resolution::ForeignThenable(then)) => self.adopt_thenable(&then),
            Ok(Resolution::Plain(value)) => self.schedule_fulfillment(value),
        }
        Ok(())
    }

    pub(crate) fn reject_unlocked(&self, reason: Value) -> Result<(), JsError> {
        if self.is_settled() {
            return Ok(());
        }
        let emitter = match &reason {
            Value::Object(object) => match resolution::emitter_capability(object) {
                Ok(true) => Some(object.clone()),
                Ok(false) => None,
                Err(error) => {
                    self.report(FailureKind::Adoption, &error);
                    self.schedule_rejection(error.into_value());
                    return Ok(());
                }
            },
            _ => None,
        };
        match emitter {
            Some(emitter) => {
                let intermediary = signal::adapt(self.runtime(), &emitter)?;
                let promise = self.clone();
                intermediary.react(
                    move |payload| promise.schedule_rejection(payload),
                    |_| {},
                );
            }
            None => self.schedule_rejection(reason),
        }
        Ok(())
    }

    fn adopt(&self, other: &Promise) {
        trace!("adopting pending outcome of another promise");
        let on_value = self.clone();
        let on_reason = self.clone();
        other.react(
            move |value| on_value.schedule_fulfillment(value),
            move |reason| {
                if let Err(error) = on_reason.reject_unlocked(reason) {
                    on_reason.report(FailureKind::Adoption, &error);
                    on_reason.schedule_rejection(error.into_value());
                }
            },
        );
    }

    fn adopt_thenable(&self, then: &Function) {
        debug!("adopting foreign thenable");
        let called = Rc::new(Cell::new(false));

        let resolve_fn = {
            let promise = self.clone();
            let called = called.clone();
            Function::new(move |args| {
                if !called.replace(true) {
                    if let Err(error) = promise.resolve_unlocked(first_arg(args)) {
                        promise.report(FailureKind::Adoption, &error);
                        promise.schedule_rejection(error.into_value());
                    }
                }
                Ok(Value::Undefined)
            })
        };
        let reject_fn = {
            let promise = self.clone();
            let called = called.clone();
            Function::new(move |args| {
                if !called.replace(true) {
                    if let Err(error) = promise.reject_unlocked(first_arg(args)) {
                        promise.report(FailureKind::Adoption, &error);
                        promise.schedule_rejection(error.into_value());
                    }
                }
                Ok(Value::Undefined)
            })
        };

        if let Err(error) = then.call(vec![resolve_fn.into(), reject_fn.into()]) {
            if called.replace(true) {
                debug!(%error, "thenable threw after settling; ignored");
            } else {
                self.report(FailureKind::Adoption, &error);
                self.schedule_rejection(error.into_value());
            }
        }
    }

    fn schedule_fulfillment(&self, value: Value) {
        let promise = self.clone();
        self.runtime()
            .schedule(move || promise.settle(PromiseState::Fulfilled, value));
    }

    fn schedule_rejection(&self, reason: Value) {
        let promise = self.clone();
        self.runtime()
            .schedule(move || promise.settle(PromiseState::Rejected, reason));
    }

    fn settle(&self, state: PromiseState, result: Value) {
        {
            let mut record = self.cell.record.borrow_mut();
            if record.state != PromiseState::Pending {
                return;
            }
            record.state = state;
            record.result = result;
            record.locked = true;
        }
        trace!(state = state.as_str(), "promise settled");
        self.execute_reactions();
    }

    /// Fires and clears the reactions matching the settled state.
    fn execute_reactions(&self) {
        let (reactions, value) = {
            let mut record = self.cell.record.borrow_mut();
            let fulfill = std::mem::take(&mut record.fulfill_reactions);
            let reject = std::mem::take(&mut record.reject_reactions);
            match record.state {
                PromiseState::Fulfilled => (fulfill, record.result.clone()),
                PromiseState::Rejected => (reject, record.result.clone()),
                PromiseState::Pending => return,
            }
        };
        for reaction in reactions {
            reaction(value.clone());
        }
    }

    fn report(&self, kind: FailureKind, error: &JsError) {
        self.runtime().report(kind, error);
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.cell.record.borrow();
        match record.state {
            PromiseState::Pending => write!(f, "Promise {{ <pending> }}"),
            PromiseState::Fulfilled => write!(f, "Promise {{ <fulfilled>: {:?} }}", record.result),
            PromiseState::Rejected => write!(f, "Promise {{ <rejected>: {:?} }}", record.result),
        }
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Object(promise.cell)
    }
}

impl JsObject for PromiseCell {
    fn get(&self, key: &str) -> Result<Value, JsError> {
        let Some(cell) = self.this.upgrade() else {
            return Ok(Value::Undefined);
        };
        let promise = Promise { cell };
        Ok(match key {
            "then" => Value::function(move |args| {
                let mut args = args.into_iter();
                let on_fulfilled = args.next().and_then(|v| v.as_function().cloned());
                let on_rejected = args.next().and_then(|v| v.as_function().cloned());
                Ok(promise.then(on_fulfilled, on_rejected).into())
            }),
            "state" => Value::from(promise.state().as_str()),
            PROMISE_SIGNATURE => Value::Boolean(true),
            _ => Value::Undefined,
        })
    }

    fn has_own_property(&self, key: &str) -> bool {
        matches!(key, PROMISE_SIGNATURE | "state")
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Returns true if `value` is a promise from this or any other engine
/// instance that carries a promise marker.
pub fn is_async_value(value: &Value) -> bool {
    match value {
        Value::Object(object) => {
            object.has_own_property(PROMISE_SIGNATURE)
                || object.has_own_property(PROMISE_ITEM_SIGNATURE)
        }
        _ => false,
    }
}

pub(crate) fn first_arg(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or_default()
}
