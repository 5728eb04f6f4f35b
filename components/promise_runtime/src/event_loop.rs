//! Event loop implementation.
//!
//! A single-threaded, synchronously flushable [`Scheduler`]. Nothing runs
//! until the host calls [`EventLoop::run_until_idle`] or
//! [`EventLoop::run_turn`], which makes promise ordering fully deterministic.

use crate::scheduler::Scheduler;
use crate::task_queue::{Task, TaskHandle, TaskQueue};
use serde::Deserialize;
use std::cell::RefCell;
use thiserror::Error;
use tracing::{trace, warn};

/// Tuning knobs for an [`EventLoop`].
///
/// # Examples
///
/// ```
/// use promise_runtime::EventLoopConfig;
///
/// let config: EventLoopConfig = serde_json::from_str(r#"{ "max_tasks_per_run": 64 }"#).unwrap();
/// assert_eq!(config.max_tasks_per_run, Some(64));
/// assert_eq!(EventLoopConfig::default().max_tasks_per_run, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventLoopConfig {
    /// Upper bound on tasks executed by one `run_until_idle` call.
    /// `None` drains until the queue is empty.
    pub max_tasks_per_run: Option<usize>,
}

/// Failures of the loop itself. Failing tasks are logged, not returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLoopError {
    /// The run stopped after `budget` tasks with work still queued.
    #[error("task budget of {budget} exhausted with {remaining} task(s) still queued")]
    TaskBudgetExceeded {
        /// The configured budget
        budget: usize,
        /// Tasks left in the queue
        remaining: usize,
    },
}

/// The event loop.
///
/// Each call to [`Scheduler::schedule`] appends to a FIFO queue. Running a
/// task never holds a borrow of the queue, so tasks may freely schedule or
/// cancel other tasks.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Scheduler, Task};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let event_loop = EventLoop::new();
/// let hits = Rc::new(Cell::new(0));
/// let h = hits.clone();
/// event_loop.schedule(Task::infallible(move || h.set(h.get() + 1)));
///
/// assert_eq!(hits.get(), 0);
/// assert_eq!(event_loop.run_until_idle().unwrap(), 1);
/// assert_eq!(hits.get(), 1);
/// ```
#[derive(Debug, Default)]
pub struct EventLoop {
    queue: RefCell<TaskQueue>,
    config: EventLoopConfig,
}

impl EventLoop {
    /// Creates a new EventLoop with an empty queue.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates an EventLoop with explicit configuration.
    pub fn with_config(config: EventLoopConfig) -> Self {
        Self {
            queue: RefCell::new(TaskQueue::new()),
            config,
        }
    }

    /// Returns the loop's configuration.
    pub fn config(&self) -> &EventLoopConfig {
        &self.config
    }

    /// Runs tasks until the queue is empty, including tasks scheduled by the
    /// tasks being run.
    ///
    /// # Returns
    ///
    /// The number of tasks executed, or
    /// [`EventLoopError::TaskBudgetExceeded`] if the configured budget ran
    /// out first. Remaining tasks stay queued.
    pub fn run_until_idle(&self) -> Result<usize, EventLoopError> {
        let mut ran = 0;
        loop {
            if let Some(budget) = self.config.max_tasks_per_run {
                if ran >= budget && !self.is_idle() {
                    return Err(EventLoopError::TaskBudgetExceeded {
                        budget,
                        remaining: self.pending_tasks(),
                    });
                }
            }
            let next = self.queue.borrow_mut().dequeue();
            let Some((handle, task)) = next else {
                break;
            };
            Self::run_task(handle, task);
            ran += 1;
        }
        Ok(ran)
    }

    /// Processes one turn: every task queued before this call, but none of
    /// the tasks they schedule.
    pub fn run_turn(&self) -> usize {
        let boundary = self.queue.borrow().next_handle();
        let mut ran = 0;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.front() {
                    Some(handle) if handle < boundary => queue.dequeue(),
                    _ => None,
                }
            };
            let Some((handle, task)) = next else {
                break;
            };
            Self::run_task(handle, task);
            ran += 1;
        }
        ran
    }

    /// Returns the number of tasks waiting to run.
    pub fn pending_tasks(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns true if no task is waiting.
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns true if the task has neither run nor been cancelled.
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.queue.borrow().contains(handle)
    }

    fn run_task(handle: TaskHandle, task: Task) {
        trace!(%handle, "running task");
        if let Err(error) = task.run() {
            warn!(%handle, %error, "scheduled task failed");
        }
    }
}

impl Scheduler for EventLoop {
    fn schedule(&self, task: Task) -> TaskHandle {
        let handle = self.queue.borrow_mut().enqueue(task);
        trace!(%handle, "task scheduled");
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        if self.queue.borrow_mut().cancel(handle) {
            trace!(%handle, "task cancelled");
        }
    }
}
