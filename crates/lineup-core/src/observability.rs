//! Counters describing what an executor has done so far.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of an executor's counters.
///
/// Counters are read individually, so a snapshot taken while the drain loop
/// is busy may be off by one between fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStats {
    pub submitted: u64,
    /// Queued and not yet picked up by the drain loop.
    pub pending: u64,
    /// 0 or 1.
    pub running: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub panicked: u64,
    /// Dropped by the runtime before producing a result.
    pub abandoned: u64,
}

/// How a single drain loop iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settlement {
    Succeeded,
    Failed,
    TimedOut,
    Panicked,
    /// The task was cancelled by its runtime (shutdown), not by itself.
    Abandoned,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    dequeued: AtomicU64,
    settled: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    panicked: AtomicU64,
    abandoned: AtomicU64,
}

impl Counters {
    pub(crate) fn submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo `submitted` for an item the queue refused.
    pub(crate) fn rejected(&self) {
        self.submitted.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn settled(&self, settlement: Settlement) {
        let counter = match settlement {
            Settlement::Succeeded => &self.succeeded,
            Settlement::Failed => &self.failed,
            Settlement::TimedOut => &self.timed_out,
            Settlement::Panicked => &self.panicked,
            Settlement::Abandoned => &self.abandoned,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.settled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExecutorStats {
        let submitted = self.submitted.load(Ordering::Relaxed);
        let dequeued = self.dequeued.load(Ordering::Relaxed);
        let settled = self.settled.load(Ordering::Relaxed);
        ExecutorStats {
            submitted,
            pending: submitted.saturating_sub(dequeued),
            running: dequeued.saturating_sub(settled),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}
