use super::dispatcher::Dispatcher;
use super::panic_handler::TaskPanic;
use super::queue::PoolState;
use super::shared::Shared;
use super::task::{Task, TaskId};
use super::worker::{Worker, WorkerStatus};
use crate::config::Config;
use crate::error::{Error, Result};
use crossbeam_channel::Receiver;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A fixed-size pool of worker threads fed by a single FIFO dispatcher.
///
/// Tasks leave the queue in submission order. With one worker they also
/// complete in that order; with more, completion order is unspecified.
///
/// Dropping the pool tears it down: it waits for every submitted task, then
/// stops and joins all of its threads. Call [`ThreadPool::shutdown`] to do the
/// same explicitly.
///
/// # Example
///
/// ```
/// use dispatch_pool::ThreadPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = ThreadPool::new(4).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..100 {
///     let counter = counter.clone();
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     })
///     .unwrap();
/// }
///
/// pool.wait_for_drain();
/// assert_eq!(counter.load(Ordering::Relaxed), 100);
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
    dispatcher: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    num_threads: usize,
}

impl ThreadPool {
    /// Creates a pool with `num_threads` workers and default settings.
    ///
    /// A pool with zero workers accepts submissions but never runs them, so
    /// `wait_for_drain` on it blocks forever once anything was submitted.
    pub fn new(num_threads: usize) -> Result<Self> {
        let config = Config::builder().num_threads(num_threads).build()?;
        Self::with_config(&config)
    }

    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let num_threads = config.worker_threads();
        let shared = Arc::new(Shared::new(num_threads, config.panic_strategy));

        // threads spawned so far are torn down by Drop if a later spawn fails
        let mut pool = Self {
            shared,
            dispatcher: None,
            workers: Vec::with_capacity(num_threads),
            num_threads,
        };

        let cores = num_cpus::get().max(1);
        for id in 0..num_threads {
            let worker = Worker::new(id, pool.shared.clone());
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let pin_workers = config.pin_workers;
            let handle = builder
                .spawn(move || {
                    #[cfg(target_os = "linux")]
                    if pin_workers {
                        super::worker::pin_thread_to_core(id % cores);
                    }
                    #[cfg(not(target_os = "linux"))]
                    let _ = (pin_workers, cores);

                    worker.run();
                })
                .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

            pool.workers.push(handle);
        }

        let dispatcher = Dispatcher::new(pool.shared.clone());
        let handle = thread::Builder::new()
            .name(format!("{}-dispatch", config.thread_name_prefix))
            .spawn(move || dispatcher.run())
            .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;
        pool.dispatcher = Some(handle);

        tracing::debug!(workers = num_threads, "thread pool started");
        Ok(pool)
    }

    /// Queues `f` for execution and returns immediately.
    pub fn submit<F>(&self, f: F) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Task::new(f))
    }

    /// Queues a prebuilt task. Empty tasks are rejected with
    /// [`Error::InvalidArgument`]; any submission after teardown began is
    /// rejected with [`Error::IllegalState`].
    pub fn submit_task(&self, task: Task) -> Result<TaskId> {
        self.shared.submit(task)
    }

    /// Blocks until the queue is empty and no task is executing.
    ///
    /// Tasks submitted by running tasks are waited for as well. Must not be
    /// called from inside a task of the same pool.
    pub fn wait_for_drain(&self) {
        self.shared.wait_for_drain();
    }

    /// Returns a cloneable handle for submitting from other threads or from
    /// inside tasks.
    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn state(&self) -> PoolState {
        self.shared.queue.state()
    }

    /// Tasks waiting in the queue.
    pub fn pending(&self) -> usize {
        self.shared.queue.pending()
    }

    /// Tasks taken off the queue and not yet finished.
    pub fn active(&self) -> usize {
        self.shared.queue.active()
    }

    pub fn worker_status(&self, id: usize) -> Option<WorkerStatus> {
        (id < self.num_threads).then(|| self.shared.workers.status(id))
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            submitted: self.shared.submitted.load(Ordering::Relaxed),
            completed: self.shared.completed.load(Ordering::Relaxed),
            panicked: self.shared.workers.tasks_panicked(),
            pending: self.pending(),
            active: self.active(),
            executed_per_worker: self.shared.workers.tasks_executed(),
        }
    }

    /// Receiver for panics captured from task bodies.
    pub fn panics(&self) -> Receiver<TaskPanic> {
        self.shared.panic_handler.receiver()
    }

    /// Drains every panic reported so far.
    pub fn take_panics(&self) -> Vec<TaskPanic> {
        self.shared.panic_handler.drain()
    }

    pub fn panic_count(&self) -> usize {
        self.shared.panic_handler.panic_count()
    }

    /// Waits for every submitted task, then stops and joins all threads.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.shared.queue.begin_teardown() {
            return;
        }

        tracing::debug!("thread pool draining");
        self.shared.wait_for_drain();

        self.shared.queue.set_state(PoolState::ShuttingDown);
        self.shared.shutdown.store(true, Ordering::Release);

        self.shared.new_task.signal();
        self.shared.workers.wake_dispatcher();
        self.shared.workers.signal_all();

        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.join().is_err() {
                tracing::error!("dispatcher thread panicked");
            }
        }
        for (id, worker) in self.workers.drain(..).enumerate() {
            if worker.join().is_err() {
                tracing::error!(worker = id, "worker thread panicked");
            }
        }

        self.shared.queue.set_state(PoolState::Terminated);
        tracing::debug!("thread pool terminated");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("active", &self.active())
            .finish()
    }
}

/// A shared reference to a pool's queue.
///
/// Handles can submit and wait but never own threads, so dropping one on a
/// worker thread is fine. Once the owning [`ThreadPool`] starts tearing down,
/// submissions through a handle fail with [`Error::IllegalState`].
#[derive(Clone)]
pub struct PoolHandle {
    shared: Arc<Shared>,
}

impl PoolHandle {
    pub fn submit<F>(&self, f: F) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Task::new(f))
    }

    pub fn submit_task(&self, task: Task) -> Result<TaskId> {
        self.shared.submit(task)
    }

    /// See [`ThreadPool::wait_for_drain`].
    pub fn wait_for_drain(&self) {
        self.shared.wait_for_drain();
    }

    pub fn state(&self) -> PoolState {
        self.shared.queue.state()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Point-in-time counters for a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
    pub pending: usize,
    pub active: usize,
    pub executed_per_worker: Vec<u64>,
}
