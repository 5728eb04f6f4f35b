//! The scheduling primitive the promise engine is built on.
//!
//! The engine never runs a state transition or a reaction inline. Everything
//! goes through a [`Scheduler`], which runs callbacks after the current
//! synchronous turn. Hosts inject their own implementation (a GUI timer, an
//! embedder's job queue); [`crate::EventLoop`] is the deterministic one used
//! by tests and simple embedders.

use crate::task_queue::{Task, TaskHandle};
use std::rc::Rc;

/// Schedules callbacks to run after the current synchronous turn.
///
/// Implementations must run tasks in FIFO order among tasks scheduled in the
/// same turn, and must accept new tasks while a task is running.
pub trait Scheduler {
    /// Queues `task` and returns a handle that can cancel it.
    fn schedule(&self, task: Task) -> TaskHandle;

    /// Cancels a task that has not run yet. No-op if it already ran.
    fn cancel(&self, handle: TaskHandle);
}

/// Shared handle to an injected scheduler.
pub type SchedulerRef = Rc<dyn Scheduler>;
