//! Pending-task queue paired with the active-task count.
//!
//! Both live under one lock: a task leaving the queue is counted as active in
//! the same critical section, so the drained predicate never sees a task that
//! is in neither place.

use super::task::{Task, TaskId};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Lifecycle of a pool. Submissions are accepted only while `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Running,
    Draining,
    ShuttingDown,
    Terminated,
}

#[derive(Debug)]
struct QueueState {
    tasks: VecDeque<Task>,
    active: usize,
    state: PoolState,
}

impl QueueState {
    fn is_drained(&self) -> bool {
        self.tasks.is_empty() && self.active == 0
    }
}

#[derive(Debug)]
pub(crate) struct TaskQueue {
    inner: Mutex<QueueState>,
    drained: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                active: 0,
                state: PoolState::Running,
            }),
            drained: Condvar::new(),
        }
    }

    /// Appends a task. Fails without touching the queue unless the pool is running.
    pub fn push(&self, task: Task) -> Result<TaskId> {
        let mut inner = self.inner.lock();
        if inner.state != PoolState::Running {
            return Err(Error::illegal_state(format!(
                "cannot submit to a pool that is {:?}",
                inner.state
            )));
        }
        let id = task.id();
        inner.tasks.push_back(task);
        Ok(id)
    }

    /// Pops the oldest task and counts it as active.
    pub fn pop_active(&self) -> Option<Task> {
        let mut inner = self.inner.lock();
        let task = inner.tasks.pop_front()?;
        inner.active += 1;
        Some(task)
    }

    /// Undoes `pop_active` for a task that could not be handed to a worker.
    /// The task goes back to the front, so dispatch order is unchanged.
    pub fn requeue_front(&self, task: Task) {
        let mut inner = self.inner.lock();
        inner.tasks.push_front(task);
        inner.active -= 1;
    }

    /// Marks one active task as finished.
    pub fn complete(&self) {
        let mut inner = self.inner.lock();
        debug_assert!(inner.active > 0, "completion without a matching dequeue");
        inner.active -= 1;
        if inner.is_drained() {
            self.drained.notify_all();
        }
    }

    pub fn wait_drained(&self) {
        let mut inner = self.inner.lock();
        while !inner.is_drained() {
            self.drained.wait(&mut inner);
        }
    }

    /// Moves `Running` to `Draining`. Returns `false` if teardown already began.
    pub fn begin_teardown(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != PoolState::Running {
            return false;
        }
        inner.state = PoolState::Draining;
        true
    }

    pub fn set_state(&self, state: PoolState) {
        self.inner.lock().state = state;
    }

    pub fn state(&self) -> PoolState {
        self.inner.lock().state
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    pub fn active(&self) -> usize {
        self.inner.lock().active
    }
}
