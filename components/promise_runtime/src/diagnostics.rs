//! Diagnostic reporting for failures the engine converts into rejections.
//!
//! Reports are informational. A sink cannot change what happens to the
//! failure: it has already become (or is about to become) a rejection.

use core_types::JsError;
use std::cell::RefCell;
use std::fmt;
use tracing::error;

/// Where a failure was caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A value was resolved with itself.
    SelfResolution,
    /// Classifying or attaching to a foreign thenable or emitter threw.
    Adoption,
    /// The executor passed to a constructor threw.
    Executor,
    /// An `on_fulfilled`/`on_rejected` handler threw.
    Reaction,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::SelfResolution => "self-resolution",
            FailureKind::Adoption => "adoption",
            FailureKind::Executor => "executor",
            FailureKind::Reaction => "reaction",
        };
        f.write_str(name)
    }
}

/// Receives failures caught at engine boundaries.
pub trait DiagnosticSink {
    /// Called once per caught failure, before it propagates as a rejection.
    fn report(&self, kind: FailureKind, error: &JsError);
}

/// Logs every report through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, kind: FailureKind, error: &JsError) {
        error!(%kind, %error, "uncaught failure converted to rejection");
    }
}

/// Keeps every report in memory.
///
/// # Examples
///
/// ```
/// use core_types::JsError;
/// use promise_runtime::{DiagnosticSink, FailureKind, RecordingSink};
///
/// let sink = RecordingSink::new();
/// sink.report(FailureKind::Reaction, &JsError::type_error("x"));
/// assert_eq!(sink.kinds(), vec![FailureKind::Reaction]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: RefCell<Vec<(FailureKind, JsError)>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything reported so far.
    pub fn reports(&self) -> Vec<(FailureKind, JsError)> {
        self.reports.borrow().clone()
    }

    /// Returns just the kinds, in report order.
    pub fn kinds(&self) -> Vec<FailureKind> {
        self.reports.borrow().iter().map(|(k, _)| *k).collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, kind: FailureKind, error: &JsError) {
        self.reports.borrow_mut().push((kind, error.clone()));
    }
}
