//! Counting semaphore.
//!
//! `signal` never blocks. `wait` blocks until the count is positive and then
//! takes one unit. Every waiter re-checks the count after waking, so a single
//! `signal` may wake several threads while only one of them proceeds.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct Semaphore {
    count: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }

    pub fn signal(&self) {
        let mut count = self.count.lock();
        *count += 1;
        // waiters only exist while the count is zero
        if *count == 1 {
            self.cond.notify_all();
        }
    }

    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.cond.wait(&mut count);
        }
        *count -= 1;
    }

    /// Takes one unit without blocking. Returns `false` if none was available.
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    pub fn available(&self) -> usize {
        *self.count.lock()
    }
}
