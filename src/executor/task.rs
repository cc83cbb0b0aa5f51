//! Task representation and execution.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Thunk = Box<dyn FnOnce() + Send + 'static>;

/// A zero-argument unit of work.
///
/// The closure owns whatever it captures; the pool only holds the task until
/// it is invoked. A task built with [`Task::empty`] carries no closure and is
/// rejected on submission.
pub struct Task {
    id: TaskId,
    func: Option<Thunk>,
    spawn_time: Instant,
}

impl Task {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Some(Box::new(f)),
            spawn_time: Instant::now(),
        }
    }

    pub fn empty() -> Self {
        Task {
            id: TaskId::next(),
            func: None,
            spawn_time: Instant::now(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.func.is_none()
    }

    pub fn spawn_time(&self) -> Instant {
        self.spawn_time
    }

    /// Runs the closure. An empty task does nothing.
    pub(crate) fn execute(self) {
        if let Some(func) = self.func {
            func();
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Task::empty()
    }
}

impl<F> From<Option<F>> for Task
where
    F: FnOnce() + Send + 'static,
{
    fn from(f: Option<F>) -> Self {
        match f {
            Some(f) => Task::new(f),
            None => Task::empty(),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("empty", &self.is_empty())
            .field("spawn_time", &self.spawn_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_task_ids_are_unique() {
        let a = Task::new(|| {});
        let b = Task::new(|| {});
        assert_ne!(a.id(), b.id());
        assert!(a.id() < b.id());
    }

    #[test]
    fn test_execute_runs_closure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = Task::new(move || flag.store(true, Ordering::SeqCst));

        assert!(!task.is_empty());
        task.execute();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_empty_task() {
        let task = Task::default();
        assert!(task.is_empty());
        task.execute();

        let none: Option<fn()> = None;
        assert!(Task::from(none).is_empty());
        assert!(!Task::from(Some(|| {})).is_empty());
    }
}
