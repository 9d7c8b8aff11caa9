//! Deferred task queue driven one tick at a time.
//!
//! Work posted with [`TaskQueue::post`] runs on the next call to
//! [`TaskQueue::run_tick`]. A tick only runs the tasks that were queued when
//! it started; anything posted while the tick is running waits for the
//! following tick. This is the "run after the current event finishes"
//! deferral that pointer-press handling relies on.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;

/// A unique identifier for a deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

struct TaskData {
    id: TaskId,
    task: BoxedTask,
}

/// Shared handle to a tick-driven task queue.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<Mutex<VecDeque<TaskData>>>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task for the next tick.
    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = next_task_id();
        self.tasks.lock().push_back(TaskData {
            id,
            task: Box::new(task),
        });
        tracing::trace!(target: targets::TICK, id = id.as_u64(), "task posted");
        id
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run every task queued before this call, in posting order.
    ///
    /// Returns the number of tasks run.
    pub fn run_tick(&self) -> usize {
        let batch: Vec<TaskData> = self.tasks.lock().drain(..).collect();
        let count = batch.len();
        for task_data in batch {
            tracing::trace!(target: targets::TICK, id = task_data.id.as_u64(), "running task");
            (task_data.task)();
        }
        count
    }

    /// Run ticks until the queue is empty or `max_ticks` ticks have run.
    ///
    /// Returns the total number of tasks run.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_ticks {
            if !self.has_pending() {
                break;
            }
            total += self.run_tick();
        }
        total
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending_count())
            .finish()
    }
}
