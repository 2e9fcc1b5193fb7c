//! ExecutorBuilder: validated construction of an [`Executor`].

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::Executor;
use crate::config::ExecutorConfig;
use crate::error::BuildError;

const DEFAULT_NAME: &str = "lineup";

/// Builds an [`Executor`].
///
/// # Example
/// ```ignore
/// let executor = Executor::builder()
///     .name("uploads")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
///
/// `build()` is fail-fast: a negative timeout or a missing runtime is
/// reported before any drain loop is spawned.
#[derive(Debug, Default)]
pub struct ExecutorBuilder {
    config: ExecutorConfig,
    timeout: Option<Duration>,
    name: Option<String>,
    runtime: Option<Handle>,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration. Clears any earlier `timeout()`.
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self.timeout = None;
        self
    }

    /// Wait at most `timeout` for each task. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Same as `config(ExecutorConfig::with_timeout_ms(ms))`.
    pub fn timeout_ms(self, timeout_ms: i64) -> Self {
        self.config(ExecutorConfig::with_timeout_ms(timeout_ms))
    }

    /// Name used in log fields. Defaults to `"lineup"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Runtime that hosts the drain loop. Defaults to the current runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<Executor, BuildError> {
        // (1) 設定の検証: 不正な timeout はここで弾く
        let configured = self.config.timeout()?;
        let timeout = match self.timeout {
            Some(explicit) if explicit.is_zero() => None,
            Some(explicit) => Some(explicit),
            None => configured,
        };

        // (2) runtime の決定: 明示指定がなければ現在の runtime
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BuildError::NoRuntime)?,
        };

        let name: Arc<str> = Arc::from(self.name.as_deref().unwrap_or(DEFAULT_NAME));
        Ok(Executor::spawn(name, timeout, &runtime))
    }
}
