// worker thread stuff
use super::shared::Shared;
use super::task::Task;
use crate::sync::Semaphore;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub type WorkerId = usize;

/// Where a worker is in its Idle -> Assigned -> Executing -> Idle cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    /// Holding a task it has not started yet.
    Assigned,
    Executing,
}

impl WorkerStatus {
    pub fn available(self) -> bool {
        self == WorkerStatus::Idle
    }

    pub fn assigned(self) -> bool {
        matches!(self, WorkerStatus::Assigned | WorkerStatus::Executing)
    }
}

#[derive(Debug)]
struct WorkerSlot {
    status: WorkerStatus,
    task: Option<Task>,
}

// stats for each worker
#[derive(Debug)]
struct WorkerState {
    ready: Semaphore,
    tasks_executed: AtomicU64,
    tasks_panicked: AtomicU64,
}

/// Availability table for every worker plus their private wake-up signals.
#[derive(Debug)]
pub(crate) struct WorkerSet {
    slots: Mutex<Vec<WorkerSlot>>,
    available: Condvar,
    states: Vec<WorkerState>,
}

impl WorkerSet {
    pub fn new(n: usize) -> Self {
        let slots = (0..n)
            .map(|_| WorkerSlot {
                status: WorkerStatus::Idle,
                task: None,
            })
            .collect();
        let states = (0..n)
            .map(|_| WorkerState {
                ready: Semaphore::new(0),
                tasks_executed: AtomicU64::new(0),
                tasks_panicked: AtomicU64::new(0),
            })
            .collect();

        Self {
            slots: Mutex::new(slots),
            available: Condvar::new(),
            states,
        }
    }

    /// Blocks until some worker is idle, then hands it `task`.
    ///
    /// Picks the lowest-indexed idle worker. If `shutdown` is raised while
    /// waiting the task is handed back. The caller must signal the returned
    /// worker after this returns.
    pub fn assign(&self, task: Task, shutdown: &AtomicBool) -> Result<WorkerId, Task> {
        let mut slots = self.slots.lock();
        loop {
            if shutdown.load(Ordering::Acquire) {
                return Err(task);
            }
            if let Some(id) = slots.iter().position(|slot| slot.status.available()) {
                let slot = &mut slots[id];
                slot.status = WorkerStatus::Assigned;
                slot.task = Some(task);
                return Ok(id);
            }
            self.available.wait(&mut slots);
        }
    }

    /// Takes the task assigned to `id` and marks the worker as executing.
    fn begin(&self, id: WorkerId) -> Option<Task> {
        let mut slots = self.slots.lock();
        let slot = &mut slots[id];
        let task = slot.task.take()?;
        slot.status = WorkerStatus::Executing;
        Some(task)
    }

    fn release(&self, id: WorkerId) {
        let mut slots = self.slots.lock();
        slots[id].status = WorkerStatus::Idle;
        self.available.notify_one();
    }

    pub fn signal(&self, id: WorkerId) {
        self.states[id].ready.signal();
    }

    pub fn signal_all(&self) {
        for state in &self.states {
            state.ready.signal();
        }
    }

    /// Wakes a dispatcher blocked in `assign` so it can observe shutdown.
    pub fn wake_dispatcher(&self) {
        let _slots = self.slots.lock();
        self.available.notify_all();
    }

    pub fn status(&self, id: WorkerId) -> WorkerStatus {
        self.slots.lock()[id].status
    }

    pub fn tasks_executed(&self) -> Vec<u64> {
        self.states
            .iter()
            .map(|s| s.tasks_executed.load(Ordering::Relaxed))
            .collect()
    }

    pub fn tasks_panicked(&self) -> u64 {
        self.states
            .iter()
            .map(|s| s.tasks_panicked.load(Ordering::Relaxed))
            .sum()
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    shared: Arc<Shared>,
}

impl Worker {
    pub fn new(id: WorkerId, shared: Arc<Shared>) -> Self {
        Self { id, shared }
    }

    // main loop
    pub fn run(self) {
        let workers = &self.shared.workers;
        let state = &workers.states[self.id];
        tracing::debug!(worker = self.id, "worker started");

        loop {
            state.ready.wait();

            if self.shared.is_shutdown() {
                break;
            }

            let Some(task) = workers.begin(self.id) else {
                continue;
            };

            let task_id = task.id();
            tracing::trace!(worker = self.id, task = %task_id, "executing task");

            // no pool lock is held while the body runs
            let ok = self
                .shared
                .panic_handler
                .execute(task_id, self.id, || task.execute());

            state.tasks_executed.fetch_add(1, Ordering::Relaxed);
            if !ok {
                state.tasks_panicked.fetch_add(1, Ordering::Relaxed);
            }

            workers.release(self.id);
            self.shared.task_finished();
        }

        tracing::debug!(worker = self.id, "worker exiting");
    }
}

#[cfg(target_os = "linux")]
pub(crate) fn pin_thread_to_core(core_id: usize) {
    unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut cpuset);
        let result = libc::sched_setaffinity(
            0, // current thread
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpuset,
        );
        if result != 0 {
            tracing::warn!(
                thread = std::thread::current().name().unwrap_or("unknown"),
                core_id,
                "failed to pin thread to core"
            );
        }
    }
}
