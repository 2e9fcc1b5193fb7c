mod cli;
mod config;
mod logging;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tokio::time::{Duration, sleep};
use tracing::info;

use lineup_core::{Executor, ExecutorError, ExecutorStats, TaskHandle, TaskStatus};

use crate::cli::CliArgs;

/// Fails on purpose a fixed number of times, then greets.
struct Greeter {
    remaining_failures: AtomicU32,
}

impl Greeter {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }

    async fn greet(&self, name: &str) -> Result<String, String> {
        // each job takes a moment so the serialization is visible in the logs
        sleep(Duration::from_millis(5)).await;

        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(format!("intentional failure (left={left})"));
        }

        let line = format!("Hello, {name}!");
        println!("{line}");
        Ok(line)
    }
}

/// Sleeps in small steps and gives up early once its wait has timed out.
async fn slow_job(total_ms: u64, status: TaskStatus) -> Result<String, String> {
    let step = Duration::from_millis(10);
    let mut waited = Duration::ZERO;
    while waited < Duration::from_millis(total_ms) {
        if status.timed_out() {
            info!(seq = status.seq(), "slow job noticed its timeout; stopping early");
            return Err("abandoned after timeout".to_string());
        }
        sleep(step).await;
        waited += step;
    }
    Ok(format!("slow job finished after {total_ms}ms"))
}

#[derive(Debug, Serialize)]
struct JobReport {
    seq: u64,
    job: String,
    outcome: &'static str,
    detail: String,
}

#[derive(Debug, Serialize)]
struct RunReport {
    jobs: Vec<JobReport>,
    stats: ExecutorStats,
}

async fn report(job: String, handle: TaskHandle<String, String>) -> JobReport {
    let seq = handle.seq();
    let (outcome, detail) = match handle.await {
        Ok(value) => ("succeeded", value),
        Err(ExecutorError::Task(e)) => ("failed", e),
        Err(e @ ExecutorError::Timeout(_)) => ("timed_out", e.to_string()),
        Err(e) => ("error", e.to_string()),
    };
    JobReport {
        seq,
        job,
        outcome,
        detail,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    logging::init_logging(args.log_level)?;

    // (A) 設定を解決して Executor を組み立てる
    let cfg = config::resolve(&args)?;
    let executor = Executor::builder().name("lineup-cli").config(cfg).build()?;
    info!(timeout = ?executor.timeout(), jobs = args.names.len(), "executor ready");

    // (B) ジョブ投入: submit は即座に戻り、実行は投入順に1件ずつ
    let greeter = Arc::new(Greeter::new(args.fail_first));
    let mut pending = Vec::new();
    for name in &args.names {
        let greeter = Arc::clone(&greeter);
        let job_name = name.clone();
        let handle = executor.submit(move || async move { greeter.greet(&job_name).await });
        pending.push((format!("greet:{name}"), handle));
    }
    if args.slow_ms > 0 {
        let total_ms = args.slow_ms;
        let handle = executor.submit_with_status(move |status| slow_job(total_ms, status));
        pending.push((format!("slow:{total_ms}ms"), handle));
    }

    // (C) 結果を投入順に回収
    let mut jobs = Vec::with_capacity(pending.len());
    for (job, handle) in pending {
        jobs.push(report(job, handle).await);
    }

    let run = RunReport {
        jobs,
        stats: executor.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}
