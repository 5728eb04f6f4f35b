//! The engine context: an injected scheduler plus a diagnostic sink.
//!
//! Every promise belongs to one [`Runtime`] and schedules through it. Two
//! runtimes are isolated from each other but can still exchange promises,
//! which then adopt each other as thenables.

use crate::combinator::{CombineMode, Combinator};
use crate::diagnostics::{DiagnosticSink, FailureKind, TracingSink};
use crate::event_loop::{EventLoop, EventLoopConfig};
use crate::promise::Promise;
use crate::scheduler::SchedulerRef;
use crate::task_queue::{Task, TaskHandle};
use core_types::{Function, JsError, Value};
use std::fmt;
use std::rc::Rc;

struct RuntimeInner {
    scheduler: SchedulerRef,
    diagnostics: Rc<dyn DiagnosticSink>,
}

/// Entry point for creating promises and combining them.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use promise_runtime::Runtime;
///
/// let (runtime, event_loop) = Runtime::with_event_loop();
/// let combined = runtime
///     .all(Value::array(vec![
///         runtime.resolved(Value::Smi(1)).into(),
///         Value::Smi(2),
///     ]))
///     .unwrap();
///
/// event_loop.run_until_idle().unwrap();
/// assert_eq!(combined.result(), Some(Value::array(vec![Value::Smi(1), Value::Smi(2)])));
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Creates a runtime on top of an injected scheduler.
    pub fn new(scheduler: SchedulerRef) -> Self {
        Self::builder().scheduler(scheduler).build()
    }

    /// Starts a [`RuntimeBuilder`].
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime backed by a fresh [`EventLoop`] and returns both.
    pub fn with_event_loop() -> (Self, Rc<EventLoop>) {
        let event_loop = Rc::new(EventLoop::new());
        (Self::new(event_loop.clone()), event_loop)
    }

    /// Returns the injected scheduler.
    pub fn scheduler(&self) -> &SchedulerRef {
        &self.inner.scheduler
    }

    pub(crate) fn schedule<F>(&self, f: F) -> TaskHandle
    where
        F: FnOnce() + 'static,
    {
        self.inner.scheduler.schedule(Task::infallible(f))
    }

    pub(crate) fn report(&self, kind: FailureKind, error: &JsError) {
        self.inner.diagnostics.report(kind, error);
    }

    /// Creates a pending promise settled only through its own
    /// `resolve`/`reject`.
    pub fn pending(&self) -> Promise {
        Promise::new(self)
    }

    /// Creates a promise and runs `executor` synchronously with its resolve
    /// and reject functions.
    ///
    /// If the executor throws, the promise is rejected with what it threw
    /// (unless the executor already resolved or rejected it).
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::{JsError, Value};
    /// use promise_runtime::Runtime;
    ///
    /// let (runtime, event_loop) = Runtime::with_event_loop();
    /// let promise = runtime.promise(|_resolve, _reject| Err(JsError::throw(Value::from("boom"))));
    ///
    /// event_loop.run_until_idle().unwrap();
    /// assert!(promise.is_rejected());
    /// assert_eq!(promise.result(), Some(Value::from("boom")));
    /// ```
    pub fn promise<F>(&self, executor: F) -> Promise
    where
        F: FnOnce(Function, Function) -> Result<(), JsError>,
    {
        let promise = self.pending();
        let resolve = {
            let promise = promise.clone();
            Function::new(move |args| {
                promise.resolve(crate::promise::first_arg(args))?;
                Ok(Value::Undefined)
            })
        };
        let reject = {
            let promise = promise.clone();
            Function::new(move |args| {
                promise.reject(crate::promise::first_arg(args))?;
                Ok(Value::Undefined)
            })
        };

        if let Err(error) = executor(resolve, reject) {
            self.report(FailureKind::Executor, &error);
            promise.reject_or_report(error.into_value());
        }
        promise
    }

    /// Creates a promise resolved with `value`.
    ///
    /// `value` goes through the full resolution procedure, so thenables,
    /// emitters and promises are adopted.
    pub fn resolved(&self, value: Value) -> Promise {
        let promise = self.pending();
        promise.resolve_or_reject(value);
        promise
    }

    /// Alias of [`Runtime::resolved`].
    pub fn resolve(&self, value: Value) -> Promise {
        self.resolved(value)
    }

    /// Creates a promise rejected with `reason`.
    pub fn rejected(&self, reason: Value) -> Promise {
        let promise = self.pending();
        promise.reject_or_report(reason);
        promise
    }

    /// Alias of [`Runtime::rejected`].
    pub fn reject(&self, reason: Value) -> Promise {
        self.rejected(reason)
    }

    /// Builds a [`Combinator`] over `items`.
    ///
    /// `items` is either an array of promises, emitters, thenables and plain
    /// values, or a single such item.
    ///
    /// # Errors
    ///
    /// Fails if an emitter item refuses the subscription.
    pub fn combinator(&self, items: Value, all_settled: bool) -> Result<Combinator, JsError> {
        let mode = if all_settled {
            CombineMode::AllSettled
        } else {
            CombineMode::All
        };
        Combinator::new(self, items, mode)
    }

    /// Fulfills with the ordered results once every item fulfills; rejects
    /// as soon as any item rejects.
    ///
    /// # Errors
    ///
    /// Fails if an emitter item refuses the subscription.
    pub fn all(&self, items: Value) -> Result<Promise, JsError> {
        self.combinator(items, false).map(|c| c.combined())
    }

    /// Waits for every item to settle. Then rejects with the first-seen
    /// rejection reason if any item rejected, otherwise fulfills with the
    /// ordered results.
    ///
    /// This deliberately differs from the per-item status array produced by
    /// the common `allSettled` convention.
    ///
    /// # Errors
    ///
    /// Fails if an emitter item refuses the subscription.
    pub fn all_settled(&self, items: Value) -> Result<Promise, JsError> {
        self.combinator(items, true).map(|c| c.combined())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime {{ ... }}")
    }
}

/// Builder for [`Runtime`].
///
/// # Example
///
/// ```
/// use promise_runtime::{EventLoopConfig, RecordingSink, Runtime};
/// use std::rc::Rc;
///
/// let sink = Rc::new(RecordingSink::new());
/// let runtime = Runtime::builder()
///     .event_loop_config(EventLoopConfig { max_tasks_per_run: Some(1_000) })
///     .diagnostics(sink.clone())
///     .build();
/// # let _ = runtime;
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    scheduler: Option<SchedulerRef>,
    event_loop_config: Option<EventLoopConfig>,
    diagnostics: Option<Rc<dyn DiagnosticSink>>,
}

impl RuntimeBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an injected scheduler. Takes precedence over
    /// [`RuntimeBuilder::event_loop_config`].
    pub fn scheduler(mut self, scheduler: SchedulerRef) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Configure the default event loop used when no scheduler is injected.
    pub fn event_loop_config(mut self, config: EventLoopConfig) -> Self {
        self.event_loop_config = Some(config);
        self
    }

    /// Set the diagnostic sink. Defaults to [`TracingSink`].
    pub fn diagnostics(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Build the runtime.
    pub fn build(self) -> Runtime {
        let scheduler = self.scheduler.unwrap_or_else(|| {
            Rc::new(EventLoop::with_config(
                self.event_loop_config.unwrap_or_default(),
            ))
        });
        Runtime {
            inner: Rc::new(RuntimeInner {
                scheduler,
                diagnostics: self.diagnostics.unwrap_or_else(|| Rc::new(TracingSink)),
            }),
        }
    }
}
