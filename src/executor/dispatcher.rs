use super::shared::Shared;
use std::sync::Arc;

/// The only agent that takes tasks out of the queue.
///
/// It sleeps on the submission semaphore, then moves every queued task, in
/// order, to the first idle worker it can find.
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn run(self) {
        tracing::debug!("dispatcher started");

        'outer: loop {
            self.shared.new_task.wait();

            if self.shared.is_shutdown() {
                break;
            }

            while let Some(task) = self.shared.queue.pop_active() {
                let task_id = task.id();

                match self.shared.workers.assign(task, &self.shared.shutdown) {
                    Ok(worker) => {
                        tracing::trace!(task = %task_id, worker, "task dispatched");
                        self.shared.workers.signal(worker);
                    }
                    Err(task) => {
                        // only reachable if a submission races with shutdown
                        tracing::warn!(task = %task_id, "shutdown during dispatch, task requeued");
                        self.shared.queue.requeue_front(task);
                        break 'outer;
                    }
                }
            }
        }

        tracing::debug!("dispatcher exiting");
    }
}
