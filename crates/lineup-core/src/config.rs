//! Executor configuration.
//!
//! The configuration is a small option bag, `{ "timeout_ms": <int> }`, where
//! `0` (the default) disables the timeout. It is validated once, when the
//! executor is built, and is immutable afterwards.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// How long the drain loop waits on a single task, in milliseconds.
    ///
    /// `0` disables the timeout. Negative values are rejected at build time.
    pub timeout_ms: i64,
}

impl ExecutorConfig {
    pub fn with_timeout_ms(timeout_ms: i64) -> Self {
        Self { timeout_ms }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Validated timeout. `None` means the drain loop never stops waiting.
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        match self.timeout_ms {
            ms if ms < 0 => Err(ConfigError::NegativeTimeout(ms)),
            0 => Ok(None),
            ms => Ok(Some(Duration::from_millis(ms as u64))),
        }
    }
}
