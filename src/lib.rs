// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod server;
pub mod sources;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::resolve_config;
use crate::dag::PlanBook;
use crate::engine::{CoreRuntime, RunSummary, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::SitepipeError;
use crate::exec::RealExecutorBackend;
use crate::fs::RealFileSystem;
use crate::tasks::TaskContext;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the plan book and runtime
/// - executor and long-lived services
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let command = args.command();
    let (config_path, cfg) = resolve_config(args.config.as_deref())?;
    let root = config_root_dir(&config_path);
    let plans = PlanBook::standard();

    if args.dry_run {
        print_dry_run(&plans, command.plan_name())?;
        return Ok(());
    }

    let options = RuntimeOptions {
        exit_when_idle: command.exits_when_idle(),
        queue_length: cfg.watch.queue_length,
    };
    let ctx = TaskContext::new(root, Arc::new(cfg), Arc::new(RealFileSystem));
    let plan = command.plan_name();

    let summary = run_pipeline(ctx, plans, plan, options).await?;

    let failed = summary.failed_steps();
    if options.exit_when_idle && failed > 0 {
        return Err(SitepipeError::RunFailed {
            plan: plan.to_string(),
            failed,
        }
        .into());
    }
    Ok(())
}

/// Run `plan` with the real executor until the runtime stops.
///
/// One-shot options stop once the plan and any queued reruns finished;
/// otherwise the runtime keeps serving watch triggers until Ctrl-C.
pub async fn run_pipeline(
    ctx: TaskContext,
    plans: PlanBook,
    plan: &str,
    options: RuntimeOptions,
) -> Result<RunSummary> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(rt_tx.clone(), ctx);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(plan, "starting");
    rt_tx
        .send(RuntimeEvent::PlanTriggered {
            plan: plan.to_string(),
            reason: TriggerReason::Manual,
        })
        .await?;

    let core = CoreRuntime::new(plans, options);
    let runtime = Runtime::new(core, rt_rx, executor);
    Ok(runtime.run().await?)
}

/// Project root: the directory holding the config file, or the working
/// directory for a bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the steps of `plan` grouped into stages that may run together.
fn print_dry_run(plans: &PlanBook, plan: &str) -> Result<()> {
    let graph = plans.get(plan)?;
    println!("sitepipe dry-run: plan '{plan}' ({} steps)", graph.len());
    for (n, stage) in graph.stages().iter().enumerate() {
        let kinds: Vec<&str> = stage.iter().map(|id| graph.kind(*id).name()).collect();
        println!("  stage {}: {}", n + 1, kinds.join(", "));
    }
    debug!("dry-run complete (no execution)");
    Ok(())
}
