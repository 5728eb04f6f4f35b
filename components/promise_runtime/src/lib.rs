//! Single-threaded promise runtime.
//!
//! This crate provides a Promises/A+ compatible engine for hosts that have
//! no deferred-value primitive of their own:
//! - [`Scheduler`] - The injected "run after this turn" primitive
//! - [`EventLoop`] - A deterministic, synchronously flushable scheduler
//! - [`Promise`] - The promise state machine and `then` chaining
//! - [`Signal`] - An emitter whose first emission can settle a promise
//! - [`Combinator`] - `all` / `all_settled` aggregation
//!
//! # Overview
//!
//! Nothing settles inline. `resolve`, `reject` and `then` only queue work on
//! the scheduler, so code that runs in the same turn as a settlement always
//! observes the promise before its reactions fire.
//!
//! # Examples
//!
//! ```
//! use core_types::{Function, JsError, Value};
//! use promise_runtime::Runtime;
//!
//! let (runtime, event_loop) = Runtime::with_event_loop();
//!
//! let promise = runtime.promise(|resolve, _reject| {
//!     resolve.call(vec![Value::Smi(20)])?;
//!     Ok(())
//! });
//! let doubled = promise.then(
//!     Some(Function::new(|args| match args.first() {
//!         Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
//!         _ => Err(JsError::type_error("expected a number")),
//!     })),
//!     None,
//! );
//! let answer = doubled.then(
//!     Some(Function::new(|args| match args.first() {
//!         Some(Value::Smi(n)) => Ok(Value::Smi(n + 2)),
//!         _ => Ok(Value::Undefined),
//!     })),
//!     None,
//! );
//!
//! event_loop.run_until_idle().unwrap();
//! assert_eq!(answer.result(), Some(Value::Smi(42)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod combinator;
pub mod diagnostics;
mod error;
pub mod event_loop;
pub mod promise;
pub mod resolution;
pub mod runtime;
pub mod scheduler;
pub mod signal;
pub mod task_queue;

// Re-export main types at crate root
pub use combinator::{CombineMode, Combinator};
pub use diagnostics::{DiagnosticSink, FailureKind, RecordingSink, TracingSink};
pub use event_loop::{EventLoop, EventLoopConfig, EventLoopError};
pub use promise::{is_async_value, Promise, PromiseState, PROMISE_ITEM_SIGNATURE, PROMISE_SIGNATURE};
pub use resolution::Resolution;
pub use runtime::{Runtime, RuntimeBuilder};
pub use scheduler::{Scheduler, SchedulerRef};
pub use signal::{Signal, SUBSCRIBE, UNSUBSCRIBE};
pub use task_queue::{Task, TaskHandle, TaskQueue};
