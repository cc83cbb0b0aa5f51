use super::task::TaskId;
use super::worker::WorkerId;
use crate::error::Error;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What a worker does when a task body panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicStrategy {
    /// Abort the whole process.
    Abort,
    /// Record the panic silently.
    Isolate,
    /// Log the panic and record it.
    LogAndContinue,
}

impl Default for PanicStrategy {
    fn default() -> Self {
        PanicStrategy::LogAndContinue
    }
}

/// A captured task-body failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPanic {
    pub task: TaskId,
    pub worker: WorkerId,
    pub message: String,
}

impl fmt::Display for TaskPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} panicked on worker {}: {}",
            self.task, self.worker, self.message
        )
    }
}

impl From<TaskPanic> for Error {
    fn from(panic: TaskPanic) -> Self {
        Error::TaskPanicked {
            task: panic.task,
            message: panic.message,
        }
    }
}

/// Runs task bodies under `catch_unwind` and reports failures on a channel.
pub(crate) struct PanicHandler {
    strategy: PanicStrategy,
    panic_count: AtomicUsize,
    tx: Sender<TaskPanic>,
    rx: Receiver<TaskPanic>,
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        let (tx, rx) = unbounded();
        Self {
            strategy,
            panic_count: AtomicUsize::new(0),
            tx,
            rx,
        }
    }

    /// Runs `f`. Returns `false` if it panicked.
    pub fn execute<F>(&self, task: TaskId, worker: WorkerId, f: F) -> bool
    where
        F: FnOnce(),
    {
        let payload = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => return true,
            Err(payload) => payload,
        };

        self.panic_count.fetch_add(1, Ordering::Relaxed);
        let report = TaskPanic {
            task,
            worker,
            message: panic_message(payload.as_ref()),
        };

        match self.strategy {
            PanicStrategy::Abort => {
                tracing::error!(%task, worker, message = %report.message, "task panicked, aborting");
                std::process::abort();
            }
            PanicStrategy::Isolate => {}
            PanicStrategy::LogAndContinue => {
                tracing::error!(%task, worker, message = %report.message, "task panicked");
            }
        }

        // the handler owns a receiver, so the channel is never disconnected
        let _ = self.tx.send(report);
        false
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn receiver(&self) -> Receiver<TaskPanic> {
        self.rx.clone()
    }

    pub fn drain(&self) -> Vec<TaskPanic> {
        self.rx.try_iter().collect()
    }
}

impl fmt::Debug for PanicHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicHandler")
            .field("strategy", &self.strategy)
            .field("panic_count", &self.panic_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
