//! The caller-side half of a submission.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::ExecutorError;

/// Future returned by [`Executor::submit`](crate::Executor::submit) and friends.
///
/// Resolves with the outcome of exactly the task it was returned for.
/// Dropping the handle does not remove the task from the queue; the task
/// still runs and its result is discarded.
#[derive(Debug)]
#[must_use = "dropping a TaskHandle discards the task's result"]
pub struct TaskHandle<T, E> {
    seq: u64,
    rx: oneshot::Receiver<Result<T, ExecutorError<E>>>,
}

impl<T, E> TaskHandle<T, E> {
    pub(crate) fn new(seq: u64, rx: oneshot::Receiver<Result<T, ExecutorError<E>>>) -> Self {
        Self { seq, rx }
    }

    /// Submission sequence number, for correlating logs. Tasks of one
    /// executor run in increasing `seq` order.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = Result<T, ExecutorError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // sender dropped without settling: the item never ran
            Poll::Ready(Err(_)) => Poll::Ready(Err(ExecutorError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
