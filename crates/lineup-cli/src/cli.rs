// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `lineup`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lineup",
    version,
    about = "Run a batch of greeting jobs through a serialized executor.",
    long_about = None
)]
pub struct CliArgs {
    /// Executor config file (JSON), e.g. `{ "timeout_ms": 500 }`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Per-task wait timeout in milliseconds (0 disables).
    ///
    /// Overrides both the config file and `LINEUP_TIMEOUT_MS`.
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub timeout_ms: Option<i64>,

    /// Names to greet, one job per name, run in this order.
    #[arg(long, value_delimiter = ',', default_value = "lineup")]
    pub names: Vec<String>,

    /// Number of jobs that fail on purpose before the rest succeed.
    #[arg(long, default_value_t = 0)]
    pub fail_first: u32,

    /// Append a slow job that takes this long (ms); 0 skips it.
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub slow_ms: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LINEUP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
