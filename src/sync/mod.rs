//! Blocking primitives used by the dispatcher and workers.

pub mod semaphore;

pub use semaphore::Semaphore;
