//! Cooperative timeout observation for running tasks.

use tokio::sync::watch;

/// Read-only view of whether the executor has stopped waiting on a task.
///
/// Handed to tasks submitted through the `*_with_status` variants. The
/// executor cannot stop a task that overran its timeout, but the task can
/// poll [`timed_out`](Self::timed_out) (or await [`expired`](Self::expired))
/// and abandon its own side effects.
///
/// The flag is owned by the drain loop iteration that runs the task; tasks
/// can only read it.
#[derive(Debug, Clone)]
pub struct TaskStatus {
    seq: u64,
    timed_out: watch::Receiver<bool>,
}

impl TaskStatus {
    pub(crate) fn channel(seq: u64) -> (TimeoutFlag, TaskStatus) {
        let (tx, rx) = watch::channel(false);
        (TimeoutFlag(tx), TaskStatus { seq, timed_out: rx })
    }

    /// Submission sequence number of the task this status belongs to.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// `true` once the caller's wait has timed out.
    pub fn timed_out(&self) -> bool {
        *self.timed_out.borrow()
    }

    /// Resolves when the caller's wait times out.
    ///
    /// Never resolves if the task settled before its timeout (or no timeout
    /// is configured).
    pub async fn expired(&self) {
        let mut rx = self.timed_out.clone();
        let closed = rx.wait_for(|timed_out| *timed_out).await.is_err();
        // timeout なしで終わった場合は永久に pending
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Write side of a [`TaskStatus`]; held by the drain loop only.
#[derive(Debug)]
pub(crate) struct TimeoutFlag(watch::Sender<bool>);

impl TimeoutFlag {
    pub(crate) fn trip(&self) {
        // send_replace: the task may have dropped every receiver already
        self.0.send_replace(true);
    }
}
