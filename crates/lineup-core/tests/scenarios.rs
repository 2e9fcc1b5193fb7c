mod common;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use rstest::rstest;
use tokio::sync::oneshot;
use tokio::time::sleep;

use common::{ConcurrencyProbe, init_tracing};
use lineup_core::{Executor, ExecutorError, ExecutorConfig};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn executor_with_timeout(ms: i64) -> Executor {
    Executor::new(ExecutorConfig::with_timeout_ms(ms)).unwrap()
}

/// Poll a future exactly once.
fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
    let mut cx = Context::from_waker(Waker::noop());
    Pin::new(fut).poll(&mut cx)
}

#[rstest]
#[case::await_in_order(false)]
#[case::await_reversed(true)]
#[tokio::test]
async fn results_are_not_confused(#[case] reversed: bool) {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();

    let first = executor.submit(|| async { Ok::<_, String>(123) });
    let second = executor.submit(|| async { Ok::<_, String>(456) });

    if reversed {
        assert_eq!(second.await.unwrap(), 456);
        assert_eq!(first.await.unwrap(), 123);
    } else {
        assert_eq!(first.await.unwrap(), 123);
        assert_eq!(second.await.unwrap(), 456);
    }
}

#[tokio::test]
async fn awaiting_later_handle_first_keeps_order() {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();
    let log: Log = Arc::default();

    let a_log = Arc::clone(&log);
    let mut a = executor.submit(move || async move {
        sleep(Duration::from_millis(1)).await;
        a_log.lock().unwrap().push("a");
        Ok::<_, ()>("a")
    });
    let b_log = Arc::clone(&log);
    let b = executor.submit(move || async move {
        sleep(Duration::from_millis(1)).await;
        b_log.lock().unwrap().push("b");
        Ok::<_, ()>("b")
    });

    assert_eq!(b.await.unwrap(), "b");

    // same drain pass: A settled before B started
    match poll_once(&mut a) {
        Poll::Ready(outcome) => assert_eq!(outcome.unwrap(), "a"),
        Poll::Pending => panic!("A must already be settled once B has settled"),
    }
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn at_most_one_task_runs_at_a_time() {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();
    let probe = Arc::new(ConcurrencyProbe::default());

    // several concurrent submitters, each bursting in the same tick
    let mut submitters = Vec::new();
    for _ in 0..4 {
        let executor = executor.clone();
        let probe = Arc::clone(&probe);
        submitters.push(tokio::spawn(async move {
            let mut handles = Vec::new();
            for _ in 0..16 {
                let probe = Arc::clone(&probe);
                handles.push(executor.submit(move || async move {
                    probe.enter();
                    tokio::task::yield_now().await;
                    sleep(Duration::from_micros(200)).await;
                    probe.exit();
                    Ok::<_, ()>(())
                }));
            }
            handles
        }));
    }

    for submitter in submitters {
        for handle in submitter.await.unwrap() {
            handle.await.unwrap();
        }
    }

    assert_eq!(probe.max_seen(), 1);
    assert_eq!(executor.stats().succeeded, 64);
}

#[tokio::test]
async fn submissions_from_inside_a_task_queue_behind_earlier_ones() {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();
    let log: Log = Arc::default();

    let (nested_tx, nested_rx) = oneshot::channel();
    let inner_executor = executor.clone();
    let a_log = Arc::clone(&log);
    let a = executor.submit(move || async move {
        a_log.lock().unwrap().push("a");
        let c_log = Arc::clone(&a_log);
        let c = inner_executor.submit(move || async move {
            c_log.lock().unwrap().push("c");
            Ok::<_, ()>(())
        });
        // awaiting `c` here would deadlock; hand it out instead
        let _ = nested_tx.send(c);
        Ok::<_, ()>(())
    });
    let b_log = Arc::clone(&log);
    let b = executor.submit(move || async move {
        b_log.lock().unwrap().push("b");
        Ok::<_, ()>(())
    });

    a.await.unwrap();
    b.await.unwrap();
    nested_rx.await.unwrap().await.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn task_under_timeout_resolves_normally() {
    init_tracing();
    let executor = executor_with_timeout(1000);

    let result = executor
        .submit(|| async {
            sleep(Duration::from_millis(1)).await;
            Ok::<_, ()>(())
        })
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn slow_task_times_out_and_queue_moves_on() {
    init_tracing();
    let executor = executor_with_timeout(20);

    let started = Instant::now();
    let slow = executor.submit(|| async {
        sleep(Duration::from_secs(10)).await;
        Ok::<_, ()>("slow")
    });
    let next = executor.submit(|| async { Ok::<_, ()>("next") });

    let err = slow.await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(next.await.unwrap(), "next");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn one_ms_timeout_rejects_one_second_task() {
    init_tracing();
    let executor = executor_with_timeout(1);

    let result = executor
        .submit(|| async {
            sleep(Duration::from_millis(1000)).await;
            Ok::<_, ()>(())
        })
        .await;

    assert!(matches!(result, Err(ExecutorError::Timeout(_))));
}

#[tokio::test]
async fn late_failure_does_not_corrupt_later_items() {
    init_tracing();
    let executor = executor_with_timeout(20);

    let doomed = executor.submit(|| async {
        sleep(Duration::from_millis(80)).await;
        Err::<u32, _>("late failure")
    });
    let quick = executor.submit(|| async { Ok::<_, &str>(2) });

    assert!(doomed.await.unwrap_err().is_timeout());
    assert_eq!(quick.await.unwrap(), 2);

    // let the abandoned task fail in the background
    sleep(Duration::from_millis(150)).await;

    let after = executor.submit(|| async { Ok::<_, &str>(3) });
    assert_eq!(after.await.unwrap(), 3);

    let stats = executor.stats();
    assert_eq!(stats.timed_out, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.succeeded, 2);
}

#[tokio::test]
async fn failing_task_rejects_with_its_own_error() {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();

    let result = executor
        .submit(|| async {
            sleep(Duration::from_millis(5)).await;
            Err::<(), _>(std::io::Error::other("Test Error"))
        })
        .await;

    match result {
        Err(ExecutorError::Task(e)) => assert_eq!(e.to_string(), "Test Error"),
        other => panic!("expected the task's own error, got {other:?}"),
    }
}

#[tokio::test]
async fn second_run_of_stateful_task_can_fail() {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();
    let flag = Arc::new(Mutex::new(false));

    let make = |flag: Arc<Mutex<bool>>| {
        move || async move {
            let mut seen = flag.lock().unwrap();
            if *seen {
                return Err("Test Error");
            }
            *seen = true;
            Ok(())
        }
    };

    let first = executor.submit(make(Arc::clone(&flag)));
    let second = executor.submit(make(Arc::clone(&flag)));

    assert!(first.await.is_ok());
    assert!(matches!(second.await, Err(ExecutorError::Task("Test Error"))));
}

#[tokio::test]
async fn cooperative_task_observes_its_timeout() {
    init_tracing();
    let executor = executor_with_timeout(20);
    let (observed_tx, observed_rx) = oneshot::channel();

    let handle = executor.submit_with_status(move |status| async move {
        while !status.timed_out() {
            sleep(Duration::from_millis(2)).await;
        }
        let _ = observed_tx.send(status.seq());
        Ok::<_, ()>(())
    });
    let seq = handle.seq();

    assert!(handle.await.unwrap_err().is_timeout());
    assert_eq!(observed_rx.await.unwrap(), seq);
}

#[tokio::test]
async fn status_stays_clear_when_task_finishes_in_time() {
    init_tracing();
    let executor = executor_with_timeout(500);

    let seen = executor
        .submit_with_status(|status| async move { Ok::<_, ()>(status.timed_out()) })
        .await
        .unwrap();

    assert!(!seen);
}

#[tokio::test]
async fn blocking_task_times_out_without_stalling_the_queue() {
    init_tracing();
    let executor = executor_with_timeout(20);

    let stuck = executor.submit_blocking_with_status(|status| {
        std::thread::sleep(Duration::from_millis(200));
        Ok::<_, ()>(status.timed_out())
    });
    let next = executor.submit_blocking(|| Ok::<_, ()>("next"));

    let started = Instant::now();
    assert!(stuck.await.unwrap_err().is_timeout());
    assert_eq!(next.await.unwrap(), "next");
    assert!(started.elapsed() < Duration::from_millis(150));
}

#[tokio::test]
async fn never_settling_task_occupies_the_loop_without_timeout() {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();

    let _stuck = executor.submit(|| std::future::pending::<Result<(), ()>>());
    let behind = executor.submit(|| async { Ok::<_, ()>(()) });

    let waited = tokio::time::timeout(Duration::from_millis(50), behind).await;
    assert!(waited.is_err(), "nothing runs behind a task that never settles");
    assert_eq!(executor.stats().pending, 1);
}

#[tokio::test]
async fn dropping_the_executor_still_drains_queued_items() {
    init_tracing();
    let executor = Executor::with_defaults().unwrap();

    let handles: Vec<_> = (0..3)
        .map(|i| {
            executor.submit(move || async move {
                sleep(Duration::from_millis(2)).await;
                Ok::<_, ()>(i)
            })
        })
        .collect();
    drop(executor);

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), i);
    }
}

#[tokio::test]
async fn shut_down_runtime_abandons_queued_items() {
    init_tracing();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let executor = Executor::builder()
        .runtime(rt.handle().clone())
        .build()
        .unwrap();

    // never driven: the drain loop never gets to run
    let queued = executor.submit(|| async { Ok::<_, ()>(()) });
    rt.shutdown_background();

    assert!(matches!(queued.await, Err(ExecutorError::Abandoned)));

    let late = executor.submit(|| async { Ok::<_, ()>(()) });
    assert!(matches!(late.await, Err(ExecutorError::Abandoned)));
    assert_eq!(executor.stats().submitted, 1);
}
