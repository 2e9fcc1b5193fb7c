//! The serialized executor.
//!
//! - [`Executor`]: cloneable submit side; every clone feeds the same queue.
//! - [`builder`]: validated construction.
//! - `item`: type-erased work items and the completion/timeout race.
//! - `drain`: the single drain loop that owns the queue's receiver.

pub mod builder;
mod drain;
mod item;

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub use self::builder::ExecutorBuilder;
use self::drain::{QueueTx, drain_loop};
use self::item::{Launch, QueuedTask};
use crate::config::ExecutorConfig;
use crate::error::BuildError;
use crate::handle::TaskHandle;
use crate::observability::{Counters, ExecutorStats};
use crate::status::TaskStatus;

/// Runs submitted tasks one at a time, strictly in submission order.
///
/// `submit*` never blocks: it appends to the queue and returns a
/// [`TaskHandle`] that resolves with that task's outcome. A single drain loop,
/// spawned when the executor is built, takes items off the front of the queue
/// and waits for each one (bounded by the optional timeout) before taking the
/// next.
///
/// Cloning is cheap and every clone shares the same queue. When the last clone
/// is dropped the drain loop finishes whatever is still queued and exits.
///
/// A task that never settles, with no timeout configured, occupies the loop
/// forever and nothing queued behind it runs. Likewise, a task must not await
/// the handle of another task submitted to the same executor: that task is
/// queued behind it.
#[derive(Clone)]
pub struct Executor {
    shared: Arc<Shared>,
}

struct Shared {
    name: Arc<str>,
    timeout: Option<Duration>,
    /// Next sequence number. Held while sending so that sequence order is
    /// queue order even with concurrent submitters.
    next_seq: Mutex<u64>,
    queue: QueueTx,
    counters: Arc<Counters>,
}

impl Executor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// Build on the current Tokio runtime.
    pub fn new(config: ExecutorConfig) -> Result<Self, BuildError> {
        ExecutorBuilder::new().config(config).build()
    }

    /// No timeout, default name, current runtime.
    pub fn with_defaults() -> Result<Self, BuildError> {
        Self::new(ExecutorConfig::default())
    }

    pub(crate) fn spawn(name: Arc<str>, timeout: Option<Duration>, runtime: &Handle) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());

        runtime.spawn(drain_loop(
            Arc::clone(&name),
            rx,
            timeout,
            Arc::clone(&counters),
        ));

        Self {
            shared: Arc::new(Shared {
                name,
                timeout,
                next_seq: Mutex::new(0),
                queue,
                counters,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.shared.timeout
    }

    pub fn stats(&self) -> ExecutorStats {
        self.shared.counters.snapshot()
    }

    /// Queue an async task.
    ///
    /// The closure is called by the drain loop when the task reaches the
    /// front of the queue, not by `submit`.
    pub fn submit<F, Fut, T, E>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.submit_with_status(move |_status: TaskStatus| task())
    }

    /// Queue an async task that can observe its own timeout through
    /// [`TaskStatus`].
    pub fn submit_with_status<F, Fut, T, E>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce(TaskStatus) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        // The closure is invoked inside the spawned task so a panic while
        // building the future is reported like any other panic.
        let launch: Launch<T, E> =
            Box::new(move |status: TaskStatus| tokio::spawn(async move { task(status).await }));
        self.enqueue(launch)
    }

    /// Queue a synchronous task. It runs on the blocking pool, so the timeout
    /// still applies to it.
    pub fn submit_blocking<F, T, E>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.submit_blocking_with_status(move |_status: TaskStatus| task())
    }

    pub fn submit_blocking_with_status<F, T, E>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce(TaskStatus) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let launch: Launch<T, E> = Box::new(move |status: TaskStatus| {
            tokio::task::spawn_blocking(move || task(status))
        });
        self.enqueue(launch)
    }

    fn enqueue<T, E>(&self, launch: Launch<T, E>) -> TaskHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let shared = &self.shared;
        let (reply, rx) = oneshot::channel();

        // seq の採番と queue への送信は同じロックの中で行う
        let mut next_seq = shared.next_seq.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = *next_seq;
        *next_seq += 1;
        shared.counters.submitted();
        let sent = shared
            .queue
            .send(Box::new(QueuedTask::new(seq, launch, reply)))
            .is_ok();
        drop(next_seq);

        if !sent {
            // drain loop is gone (its runtime shut down). The item and its
            // reply sender are dropped here, so the handle reports Abandoned.
            shared.counters.rejected();
            warn!(executor = %shared.name, seq, "drain loop is not running; task abandoned");
        } else {
            debug!(executor = %shared.name, seq, "enqueued work item");
        }

        TaskHandle::new(seq, rx)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("name", &self.shared.name)
            .field("timeout", &self.shared.timeout)
            .finish_non_exhaustive()
    }
}
