//! Task execution infrastructure.
//!
//! A [`ThreadPool`] owns a FIFO task queue, one dispatcher thread and a fixed
//! set of worker threads. The dispatcher moves queued tasks to idle workers
//! one at a time; workers run task bodies without holding any pool lock, so a
//! task may submit more work to its own pool through a [`PoolHandle`].

mod dispatcher;
pub mod panic_handler;
mod queue;
mod shared;
pub mod task;
pub mod thread_pool;
pub mod worker;

pub use panic_handler::{PanicStrategy, TaskPanic};
pub use queue::PoolState;
pub use task::{Task, TaskId};
pub use thread_pool::{PoolHandle, PoolStats, ThreadPool};
pub use worker::{WorkerId, WorkerStatus};
