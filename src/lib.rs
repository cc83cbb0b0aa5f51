//! A fixed-size worker pool with a FIFO dispatcher and drain-wait.
//!
//! Tasks are zero-argument closures. Each one runs exactly once on one of a
//! fixed set of persistent worker threads, and tasks are handed to workers in
//! the order they were submitted. Any thread can block until everything
//! submitted so far, including work submitted by running tasks, has finished.
//!
//! # Quick Start
//!
//! ```
//! use dispatch_pool::prelude::*;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! let pool = ThreadPool::new(3).unwrap();
//! let total = Arc::new(AtomicU64::new(0));
//!
//! for chunk in (1..=300u64).collect::<Vec<_>>().chunks(100) {
//!     let chunk = chunk.to_vec();
//!     let total = total.clone();
//!     pool.submit(move || {
//!         total.fetch_add(chunk.iter().sum::<u64>(), Ordering::Relaxed);
//!     })
//!     .unwrap();
//! }
//!
//! pool.wait_for_drain();
//! assert_eq!(total.load(Ordering::Relaxed), 45_150);
//! pool.shutdown();
//! ```
//!
//! # Features
//!
//! - **FIFO dispatch**: tasks leave the queue in submission order
//! - **Drain-wait**: [`ThreadPool::wait_for_drain`] from any number of threads
//! - **Reentrant submission**: tasks submit through a [`PoolHandle`]
//! - **Panic isolation**: a panicking task is reported, the worker keeps going
//! - **Implicit drain**: teardown waits for all submitted work

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod sync;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{
    PanicStrategy, PoolHandle, PoolState, PoolStats, Task, TaskId, TaskPanic, ThreadPool,
    WorkerStatus,
};
pub use sync::Semaphore;
