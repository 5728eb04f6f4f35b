//! Aggregation of a fixed, ordered set of promises into one.
//!
//! Result slots form an indexed arena: slot `i` is written at most once and
//! only by the reaction attached to child `i`. Slot writes and the
//! outstanding counter rely on single-threaded cooperative scheduling; a
//! preemptive port would need to synchronise both.

use crate::promise::{Promise, PromiseState};
use crate::resolution::emitter_capability;
use crate::runtime::Runtime;
use crate::signal;
use core_types::{JsError, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// How a [`Combinator`] treats a rejected child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Reject `combined` immediately with the first rejection.
    All,
    /// Record the first rejection and decide once every child settled.
    AllSettled,
}

struct CombinatorState {
    mode: CombineMode,
    children: Vec<Promise>,
    results: Vec<Value>,
    outstanding: usize,
    failure: Option<Value>,
    decided: bool,
}

/// An aggregation in progress.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use promise_runtime::{PromiseState, Runtime};
///
/// let (runtime, event_loop) = Runtime::with_event_loop();
/// let slow = runtime.pending();
/// let combinator = runtime
///     .combinator(Value::array(vec![slow.clone().into(), Value::Smi(2)]), false)
///     .unwrap();
/// assert_eq!(combinator.outstanding(), 1);
///
/// slow.resolve(Value::Smi(1)).unwrap();
/// event_loop.run_until_idle().unwrap();
/// assert_eq!(combinator.outstanding(), 0);
/// assert_eq!(combinator.combined().state(), PromiseState::Fulfilled);
/// ```
#[derive(Clone)]
pub struct Combinator {
    runtime: Runtime,
    state: Rc<RefCell<CombinatorState>>,
    combined: Promise,
}

impl Combinator {
    /// Normalises every item into a child promise and starts tracking them.
    ///
    /// Already-settled promises and plain values are recorded without a
    /// subscription. Emitters go through the signal adapter, marked or not;
    /// foreign thenables are adopted by a fresh promise.
    ///
    /// # Errors
    ///
    /// Fails if an emitter item refuses the subscription.
    pub fn new(runtime: &Runtime, items: Value, mode: CombineMode) -> Result<Self, JsError> {
        let combinator = Self {
            runtime: runtime.clone(),
            state: Rc::new(RefCell::new(CombinatorState {
                mode,
                children: Vec::new(),
                results: Vec::new(),
                outstanding: 0,
                failure: None,
                decided: false,
            })),
            combined: runtime.pending(),
        };

        let items = match items {
            Value::Array(items) => items.to_vec(),
            single => vec![single],
        };
        for item in items {
            let child = combinator.normalize(item)?;
            combinator.track(child);
        }
        trace!(
            children = combinator.len(),
            outstanding = combinator.outstanding(),
            "combinator built"
        );

        combinator.settle_if_done();
        Ok(combinator)
    }

    /// The aggregated promise handed to callers.
    pub fn combined(&self) -> Promise {
        self.combined.clone()
    }

    /// How rejections are treated.
    pub fn mode(&self) -> CombineMode {
        self.state.borrow().mode
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.state.borrow().children.len()
    }

    /// Returns true if there are no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children that have not settled yet.
    pub fn outstanding(&self) -> usize {
        self.state.borrow().outstanding
    }

    /// Returns true once any child rejected.
    pub fn is_failed(&self) -> bool {
        self.state.borrow().failure.is_some()
    }

    /// The first-seen rejection reason.
    pub fn failure_reason(&self) -> Option<Value> {
        self.state.borrow().failure.clone()
    }

    fn normalize(&self, item: Value) -> Result<Promise, JsError> {
        if let Some(promise) = Promise::from_value(&item) {
            return Ok(promise);
        }
        if item.as_object().is_none() {
            return Ok(Promise::fulfilled_now(&self.runtime, item));
        }
        let emitter = item
            .as_object()
            .filter(|object| matches!(emitter_capability(object), Ok(true)))
            .cloned();
        match emitter {
            Some(emitter) => signal::adapt(&self.runtime, &emitter),
            None => Ok(self.runtime.resolved(item)),
        }
    }

    fn track(&self, child: Promise) {
        let index = {
            let mut state = self.state.borrow_mut();
            state.children.push(child.clone());
            state.results.push(Value::Undefined);
            state.results.len() - 1
        };

        match child.state() {
            PromiseState::Fulfilled => {
                let value = child.result().unwrap_or_default();
                self.state.borrow_mut().results[index] = value;
            }
            PromiseState::Rejected => self.fail(child.result().unwrap_or_default()),
            PromiseState::Pending => {
                self.state.borrow_mut().outstanding += 1;
                let on_value = self.clone();
                let on_reason = self.clone();
                child.react(
                    move |value| on_value.child_fulfilled(index, value),
                    move |reason| on_reason.child_rejected(reason),
                );
            }
        }
    }

    fn child_fulfilled(&self, index: usize, value: Value) {
        {
            let mut state = self.state.borrow_mut();
            state.outstanding -= 1;
            state.results[index] = value;
        }
        self.settle_if_done();
    }

    fn child_rejected(&self, reason: Value) {
        self.state.borrow_mut().outstanding -= 1;
        self.fail(reason);
        self.settle_if_done();
    }

    fn fail(&self, reason: Value) {
        let reject_now = {
            let mut state = self.state.borrow_mut();
            if state.failure.is_none() {
                state.failure = Some(reason);
            }
            match state.mode {
                CombineMode::All => state.failure.clone(),
                CombineMode::AllSettled => None,
            }
        };
        if let Some(reason) = reject_now {
            self.combined.reject_or_report(reason);
        }
    }

    fn settle_if_done(&self) {
        let outcome = {
            let mut state = self.state.borrow_mut();
            if state.outstanding != 0 || state.decided {
                return;
            }
            state.decided = true;
            match &state.failure {
                Some(reason) => Err(reason.clone()),
                None => Ok(Value::array(state.results.clone())),
            }
        };
        match outcome {
            Ok(results) => self.combined.resolve_or_reject(results),
            Err(reason) => self.combined.reject_or_report(reason),
        }
    }
}

impl fmt::Debug for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Combinator")
            .field("mode", &state.mode)
            .field("children", &state.children.len())
            .field("outstanding", &state.outstanding)
            .field("failed", &state.failure.is_some())
            .field("combined", &self.combined)
            .finish()
    }
}
