// src/config.rs

//! Resolve the executor configuration from file, environment and flags.
//!
//! Later sources win: config file, then `LINEUP_TIMEOUT_MS`, then
//! `--timeout-ms`. Validation (e.g. negative timeouts) happens when the
//! executor is built.

use anyhow::{Context, Result};
use lineup_core::ExecutorConfig;

use crate::cli::CliArgs;

pub const TIMEOUT_ENV: &str = "LINEUP_TIMEOUT_MS";

pub fn resolve(args: &CliArgs) -> Result<ExecutorConfig> {
    let env = std::env::var(TIMEOUT_ENV).ok();
    resolve_with_env(args, env.as_deref())
}

fn resolve_with_env(args: &CliArgs, env_timeout: Option<&str>) -> Result<ExecutorConfig> {
    let mut cfg = match &args.config {
        Some(path) => ExecutorConfig::from_json_file(path)
            .with_context(|| format!("loading executor config from {}", path.display()))?,
        None => ExecutorConfig::default(),
    };

    if let Some(raw) = env_timeout {
        cfg.timeout_ms = raw
            .trim()
            .parse()
            .with_context(|| format!("{TIMEOUT_ENV} must be an integer (got {raw:?})"))?;
    }

    if let Some(ms) = args.timeout_ms {
        cfg.timeout_ms = ms;
    }

    Ok(cfg)
}
