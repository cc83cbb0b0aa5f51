//! Convenient re-exports for common use.

pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{PanicStrategy, PoolHandle, PoolState, Task, TaskId, ThreadPool};
