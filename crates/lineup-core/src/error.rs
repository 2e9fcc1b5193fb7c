//! Error types surfaced by the executor.

use std::path::PathBuf;

use thiserror::Error;

/// The wait for a task elapsed before the task settled.
///
/// This only describes the caller's wait. The task itself may still be
/// running, and may still succeed or fail later; that outcome is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out waiting for task")]
pub struct TimeoutError;

/// Outcome delivered to a [`TaskHandle`](crate::TaskHandle) when a task did
/// not produce a value.
///
/// Exactly one of these (or `Ok`) reaches each handle, exactly once.
#[derive(Debug, Error)]
pub enum ExecutorError<E> {
    /// The task's own error, propagated verbatim.
    #[error("task failed: {0}")]
    Task(E),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// The task panicked. The payload is the panic message when it was a string.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The item was dropped before it could run, e.g. the runtime hosting the
    /// drain loop shut down.
    #[error("task was dropped before it produced a result")]
    Abandoned,
}

impl<E> ExecutorError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutorError::Timeout(_))
    }

    pub fn is_task(&self) -> bool {
        matches!(self, ExecutorError::Task(_))
    }

    pub fn task_error(&self) -> Option<&E> {
        match self {
            ExecutorError::Task(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_task_error(self) -> Option<E> {
        match self {
            ExecutorError::Task(e) => Some(e),
            _ => None,
        }
    }
}

/// Invalid executor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("timeout_ms must not be negative (got {0})")]
    NegativeTimeout(i64),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to construct an [`Executor`](crate::Executor).
///
/// Construction is fail-fast: a bad configuration never produces a running
/// drain loop.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("executor must be built inside a Tokio runtime (or given a runtime handle)")]
    NoRuntime,
}
