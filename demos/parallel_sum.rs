//! Splits a sum across pool workers and combines the partial results.
//!
//! Run with `RUST_LOG=dispatch_pool=trace` to watch tasks being dispatched.

use dispatch_pool::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data: Arc<Vec<i64>> = Arc::new(vec![100, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    let num_threads = 3;
    let pool = ThreadPool::new(num_threads)?;
    let results = Arc::new(Mutex::new(vec![0i64; num_threads]));

    let n = data.len();
    let chunk_size = (n + num_threads - 1) / num_threads;

    for i in 0..num_threads {
        let start = i * chunk_size;
        let end = (start + chunk_size).min(n);
        if start >= n {
            continue;
        }

        let data = data.clone();
        let results = results.clone();
        pool.submit(move || {
            results.lock()[i] = data[start..end].iter().sum();
        })?;
    }

    pool.wait_for_drain();

    let total: i64 = results.lock().iter().sum();
    println!("Total sum of elements: {}", total);

    pool.shutdown();
    Ok(())
}
