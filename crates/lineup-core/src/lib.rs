//! lineup-core
//!
//! A serialized task executor: tasks submitted from any number of call sites
//! run one at a time, strictly in submission order, and each caller gets back
//! a handle carrying exactly its own task's outcome.
//!
//! # Modules
//! - **executor**: `Executor`, its builder, the queue and the drain loop
//! - **handle**: `TaskHandle`, the future returned by `submit`
//! - **status**: `TaskStatus`, a read-only view of whether the wait timed out
//! - **config**: `ExecutorConfig` (`{ "timeout_ms": .. }`)
//! - **error**: `ExecutorError`, `TimeoutError`, `ConfigError`, `BuildError`
//! - **observability**: `ExecutorStats` counters
//!
//! # Example
//! ```ignore
//! let executor = Executor::builder().timeout(Duration::from_secs(1)).build()?;
//!
//! let first = executor.submit(|| async { Ok::<_, MyError>(123) });
//! let second = executor.submit(|| async { Ok::<_, MyError>(456) });
//!
//! assert_eq!(second.await?, 456); // `first` has already settled by now
//! assert_eq!(first.await?, 123);
//! ```
//!
//! A timeout only stops the *wait*. The task keeps running in the background
//! and whatever it eventually produces is discarded.

pub mod config;
pub mod error;
pub mod executor;
pub mod handle;
pub mod observability;
pub mod status;

pub use config::ExecutorConfig;
pub use error::{BuildError, ConfigError, ExecutorError, TimeoutError};
pub use executor::{Executor, ExecutorBuilder};
pub use handle::TaskHandle;
pub use observability::ExecutorStats;
pub use status::TaskStatus;
