//! Deferred task registry.
//!
//! Tasks are zero-delay, one-shot callbacks. The queue is the registry of
//! pending tasks: a task leaves it when it is dequeued to run or when it is
//! cancelled.

use core_types::JsError;
use std::collections::VecDeque;
use std::fmt;

/// Identifies a scheduled task so it can be cancelled before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A task to be executed after the current turn.
///
/// A task that returns `Err` is reported by whoever runs it; the failure
/// never propagates into other tasks.
pub struct Task {
    callback: Box<dyn FnOnce() -> Result<(), JsError>>,
}

impl Task {
    /// Creates a new Task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Creates a Task from a closure that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::new(move || {
            f();
            Ok(())
        })
    }

    /// Executes the task.
    pub fn run(self) -> Result<(), JsError> {
        (self.callback)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A FIFO queue of pending tasks keyed by handle.
#[derive(Debug)]
pub struct TaskQueue {
    queue: VecDeque<(TaskHandle, Task)>,
    next_id: u64,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Adds a task to the end of the queue and returns its handle.
    pub fn enqueue(&mut self, task: Task) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.queue.push_back((handle, task));
        handle
    }

    /// Removes and returns the next task from the queue.
    pub fn dequeue(&mut self) -> Option<(TaskHandle, Task)> {
        self.queue.pop_front()
    }

    /// Removes a pending task. Returns false if it already ran or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.queue.iter().position(|(h, _)| *h == handle) {
            Some(index) => self.queue.remove(index).is_some(),
            None => false,
        }
    }

    /// Returns the handle of the task that would run next.
    pub fn front(&self) -> Option<TaskHandle> {
        self.queue.front().map(|(h, _)| *h)
    }

    /// Returns the handle the next enqueued task will receive.
    pub fn next_handle(&self) -> TaskHandle {
        TaskHandle(self.next_id)
    }

    /// Returns true if the task is still waiting to run.
    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.queue.iter().any(|(h, _)| *h == handle)
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
