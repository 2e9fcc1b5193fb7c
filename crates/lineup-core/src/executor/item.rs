//! Queued work items and the completion/timeout race.

use std::any::Any;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

use crate::error::{ExecutorError, TimeoutError};
use crate::observability::{Counters, Settlement};
use crate::status::TaskStatus;

/// Starts a task on the runtime. Called by the drain loop, never by `submit`.
pub(crate) type Launch<T, E> = Box<dyn FnOnce(TaskStatus) -> JoinHandle<Result<T, E>> + Send>;

/// One queued unit of work, with the value and error types erased so a single
/// queue can carry any task.
///
/// The drain loop owns the item after dequeueing it and runs it exactly once.
#[async_trait]
pub(crate) trait WorkItem: Send {
    fn seq(&self) -> u64;

    /// Start the task, wait for it (bounded by `timeout`), and deliver the
    /// outcome to the handle it was submitted with.
    ///
    /// The settlement is recorded in `counters` before the handle is
    /// settled, so a caller that has awaited its handle sees it in the stats.
    async fn run(self: Box<Self>, timeout: Option<Duration>, counters: &Counters) -> Settlement;
}

/// A task plus the route back to its caller's handle.
///
/// `reply` is a oneshot sender: delivering consumes it, so an item can settle
/// its handle at most once.
pub(crate) struct QueuedTask<T, E> {
    seq: u64,
    launch: Launch<T, E>,
    reply: oneshot::Sender<Result<T, ExecutorError<E>>>,
}

impl<T, E> QueuedTask<T, E> {
    pub(crate) fn new(
        seq: u64,
        launch: Launch<T, E>,
        reply: oneshot::Sender<Result<T, ExecutorError<E>>>,
    ) -> Self {
        Self { seq, launch, reply }
    }
}

#[async_trait]
impl<T, E> WorkItem for QueuedTask<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn seq(&self) -> u64 {
        self.seq
    }

    async fn run(self: Box<Self>, timeout: Option<Duration>, counters: &Counters) -> Settlement {
        // (A) 起動: status の受信側をタスクに渡す
        let QueuedTask { seq, launch, reply } = *self;
        let (flag, status) = TaskStatus::channel(seq);
        let started = Instant::now();

        // The task runs as its own Tokio task so it can outlive our wait.
        let mut running = launch(status);

        // (B) 完了とタイマーの競争
        // `None` means the timer won. On a tie the task wins: `timeout`
        // polls the inner future before the timer.
        let joined = match timeout {
            None => Some((&mut running).await),
            Some(limit) => tokio::time::timeout(limit, &mut running).await.ok(),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        // (C) 結果の分類
        let (outcome, settlement) = match joined {
            Some(Ok(Ok(value))) => (Ok(value), Settlement::Succeeded),
            Some(Ok(Err(e))) => (Err(ExecutorError::Task(e)), Settlement::Failed),
            Some(Err(join_err)) if join_err.is_cancelled() => {
                warn!(seq, elapsed_ms, "task was cancelled by its runtime");
                (Err(ExecutorError::Abandoned), Settlement::Abandoned)
            }
            Some(Err(join_err)) => {
                let message = panic_message(join_err);
                error!(seq, elapsed_ms, panic = %message, "task panicked");
                (Err(ExecutorError::Panicked(message)), Settlement::Panicked)
            }
            None => {
                flag.trip();
                warn!(seq, elapsed_ms, "task exceeded its timeout; no longer waiting on it");
                discard_late_result(seq, running);
                (Err(ExecutorError::Timeout(TimeoutError)), Settlement::TimedOut)
            }
        };

        // stats を先に更新してから handle を settle する
        counters.settled(settlement);
        debug!(seq, elapsed_ms, ?settlement, "delivering result");
        if reply.send(outcome).is_err() {
            debug!(seq, "handle was dropped before delivery; result discarded");
        }
        settlement
    }
}

/// Keep consuming a timed-out task's eventual outcome so it never surfaces
/// anywhere. Its handle has already been settled with a timeout.
fn discard_late_result<T, E>(seq: u64, running: JoinHandle<Result<T, E>>)
where
    T: Send + 'static,
    E: Send + 'static,
{
    tokio::spawn(async move {
        match running.await {
            Ok(Ok(_)) => debug!(seq, "timed-out task finished later; value discarded"),
            Ok(Err(_)) => debug!(seq, "timed-out task failed later; error discarded"),
            Err(err) if err.is_panic() => warn!(seq, "timed-out task panicked later"),
            Err(_) => debug!(seq, "timed-out task was cancelled"),
        }
    });
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => describe_panic(&*payload),
        Err(err) => err.to_string(),
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
