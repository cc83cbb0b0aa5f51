use dispatch_pool::prelude::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn counting_task(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_every_task_runs_exactly_once() {
    for workers in [1, 2, 4, 8] {
        let pool = ThreadPool::new(workers).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..500 {
            pool.submit(counting_task(&counter)).unwrap();
        }

        pool.wait_for_drain();
        assert_eq!(counter.load(Ordering::SeqCst), 500, "workers = {}", workers);
        pool.shutdown();
    }
}

#[test]
fn test_single_worker_runs_in_submission_order() {
    let pool = ThreadPool::new(1).unwrap();
    let log = Arc::new(Mutex::new(String::new()));

    for i in 0..5 {
        let log = log.clone();
        pool.submit(move || {
            log.lock().push_str(&format!("{} ", i));
        })
        .unwrap();
    }

    pool.wait_for_drain();
    assert_eq!(*log.lock(), "0 1 2 3 4 ");
}

#[test]
fn test_wait_for_drain_is_idempotent() {
    let pool = ThreadPool::new(2).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    pool.wait_for_drain();

    for _ in 0..10 {
        pool.submit(counting_task(&counter)).unwrap();
    }
    pool.wait_for_drain();
    pool.wait_for_drain();

    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

#[test]
fn test_concurrent_submitters() {
    let pool = Arc::new(ThreadPool::new(4).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    let submitters: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    pool.submit(counting_task(&counter)).unwrap();
                }
            })
        })
        .collect();

    for submitter in submitters {
        submitter.join().unwrap();
    }

    pool.wait_for_drain();
    assert_eq!(counter.load(Ordering::SeqCst), 800);
    assert_eq!(pool.stats().completed, 800);
}

fn fan_out(handle: PoolHandle, counter: Arc<AtomicUsize>, depth: u32) {
    let inner = handle.clone();
    handle
        .submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            if depth > 0 {
                for _ in 0..10 {
                    fan_out(inner.clone(), counter.clone(), depth - 1);
                }
            }
        })
        .unwrap();
}

#[test]
fn test_reentrant_submission_is_waited_for() {
    let pool = ThreadPool::new(4).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    fan_out(pool.handle(), counter.clone(), 3);

    pool.wait_for_drain();
    assert_eq!(counter.load(Ordering::SeqCst), 1 + 10 + 100 + 1000);
}

#[test]
fn test_reentrant_submission_on_single_worker() {
    // the only worker is busy running the parent while it submits children
    let pool = ThreadPool::new(1).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    fan_out(pool.handle(), counter.clone(), 2);

    pool.wait_for_drain();
    assert_eq!(counter.load(Ordering::SeqCst), 111);
}

#[test]
fn test_teardown_drains_implicitly() {
    let pool = ThreadPool::new(3).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..30 {
        let counter = counter.clone();
        pool.submit(move || {
            thread::sleep(Duration::from_millis(2));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    pool.shutdown();
    assert_eq!(counter.load(Ordering::SeqCst), 30);
}

#[test]
fn test_drop_drains_implicitly() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let pool = ThreadPool::new(2).unwrap();
        for _ in 0..20 {
            pool.submit(counting_task(&counter)).unwrap();
        }
    }
    assert_eq!(counter.load(Ordering::SeqCst), 20);
}

#[test]
fn test_submit_rejected_while_draining() {
    let pool = ThreadPool::new(1).unwrap();
    let handle = pool.handle();
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);

    pool.submit(move || {
        release_rx.recv().unwrap();
    })
    .unwrap();

    let closer = thread::spawn(move || pool.shutdown());

    while handle.state() == PoolState::Running {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(handle.state(), PoolState::Draining);

    let ran = Arc::new(AtomicUsize::new(0));
    let err = handle.submit(counting_task(&ran)).unwrap_err();
    assert!(err.is_illegal_state());

    release_tx.send(()).unwrap();
    closer.join().unwrap();

    assert_eq!(handle.state(), PoolState::Terminated);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_task_leaves_queue_unchanged() {
    let pool = ThreadPool::new(1).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    pool.submit(counting_task(&counter)).unwrap();

    let err = pool.submit_task(Task::empty()).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(pool.stats().submitted, 1);

    let none: Option<fn()> = None;
    assert!(pool.submit_task(Task::from(none)).unwrap_err().is_invalid_argument());

    pool.wait_for_drain();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(pool.stats().completed, 1);
}

#[test]
fn test_many_concurrent_waiters() {
    let pool = Arc::new(ThreadPool::new(4).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..200 {
        let counter = counter.clone();
        pool.submit(move || {
            thread::sleep(Duration::from_micros(200));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    let waiters: Vec<_> = (0..6)
        .map(|_| {
            let pool = pool.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                pool.wait_for_drain();
                counter.load(Ordering::SeqCst)
            })
        })
        .collect();

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), 200);
    }
}

#[test]
fn test_panics_are_reported_on_channel() {
    let config = Config::builder()
        .num_threads(2)
        .panic_strategy(PanicStrategy::Isolate)
        .build()
        .unwrap();
    let pool = ThreadPool::with_config(&config).unwrap();
    let panics = pool.panics();
    let counter = Arc::new(AtomicUsize::new(0));

    let failing: Vec<_> = (0..3)
        .map(|i| pool.submit(move || panic!("task {} failed", i)).unwrap())
        .collect();
    for _ in 0..20 {
        pool.submit(counting_task(&counter)).unwrap();
    }

    pool.wait_for_drain();
    assert_eq!(counter.load(Ordering::SeqCst), 20);

    let mut reported: Vec<_> = panics.try_iter().map(|p| p.task).collect();
    reported.sort();
    assert_eq!(reported, failing);

    let err: Error = dispatch_pool::TaskPanic {
        task: failing[0],
        worker: 0,
        message: "task 0 failed".to_string(),
    }
    .into();
    assert!(err.to_string().contains("task 0 failed"));
}

#[test]
fn test_custom_config() {
    let config = Config::builder()
        .num_threads(2)
        .thread_name_prefix("calc")
        .stack_size(256 * 1024)
        .build()
        .unwrap();
    let pool = ThreadPool::with_config(&config).unwrap();
    let (tx, rx) = crossbeam_channel::bounded(1);

    pool.submit(move || {
        let name = thread::current().name().map(str::to_string);
        tx.send(name).unwrap();
    })
    .unwrap();

    let name = rx.recv().unwrap().unwrap();
    assert!(name.starts_with("calc-"), "unexpected thread name {}", name);
    assert_eq!(pool.num_threads(), 2);
}
