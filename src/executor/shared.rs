// state shared by the pool, its handles, the dispatcher and the workers
use super::panic_handler::{PanicHandler, PanicStrategy};
use super::queue::TaskQueue;
use super::task::{Task, TaskId};
use super::worker::WorkerSet;
use crate::error::{Error, Result};
use crate::sync::Semaphore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug)]
pub(crate) struct Shared {
    pub queue: TaskQueue,
    pub workers: WorkerSet,
    /// Counts submissions the dispatcher has not looked at yet.
    pub new_task: Semaphore,
    pub shutdown: AtomicBool,
    pub panic_handler: PanicHandler,
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
}

impl Shared {
    pub fn new(num_workers: usize, panic_strategy: PanicStrategy) -> Self {
        Self {
            queue: TaskQueue::new(),
            workers: WorkerSet::new(num_workers),
            new_task: Semaphore::new(0),
            shutdown: AtomicBool::new(false),
            panic_handler: PanicHandler::new(panic_strategy),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn submit(&self, task: Task) -> Result<TaskId> {
        if task.is_empty() {
            return Err(Error::invalid_argument("cannot submit an empty task"));
        }

        let id = self.queue.push(task)?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.new_task.signal();

        tracing::trace!(task = %id, "task submitted");
        Ok(id)
    }

    pub fn wait_for_drain(&self) {
        self.queue.wait_drained();
    }

    /// Called by a worker once a task body has returned (or panicked).
    pub fn task_finished(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.queue.complete();
    }
}
