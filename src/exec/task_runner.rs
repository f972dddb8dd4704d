// src/exec/task_runner.rs

//! Running a single step.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::ScheduledStep;
use crate::engine::{RuntimeEvent, StepOutcome};
use crate::exec::long_lived::ServiceHost;
use crate::tasks::{self, TaskContext};

/// Run one step and report its outcome to the runtime.
///
/// Transform bodies run on the blocking pool; services are started in place
/// and complete as soon as they are up.
pub async fn run_step(
    step: ScheduledStep,
    ctx: TaskContext,
    services: Arc<ServiceHost>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let started = Instant::now();
    debug!(task = %step.kind, plan = %step.plan, run_id = step.run_id, "step started");

    let result = if step.kind.is_service() {
        services.start(step.kind, &ctx).await
    } else {
        run_body(&step, ctx).await
    };

    let outcome = match result {
        Ok(()) => StepOutcome::Success,
        Err(err) => StepOutcome::Failed(format!("{err:#}")),
    };
    info!(
        task = %step.kind,
        plan = %step.plan,
        run_id = step.run_id,
        success = matches!(outcome, StepOutcome::Success),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "step finished"
    );

    let event = RuntimeEvent::StepCompleted {
        plan: step.plan.clone(),
        run_id: step.run_id,
        step: step.step,
        outcome,
    };
    if let Err(err) = runtime_tx.send(event).await {
        warn!(task = %step.kind, "failed to send StepCompleted: {err}");
    }
}

async fn run_body(step: &ScheduledStep, ctx: TaskContext) -> Result<()> {
    let kind = step.kind;
    let report = tokio::task::spawn_blocking(move || tasks::run_task(kind, &ctx))
        .await
        .map_err(|err| anyhow!("task {kind} panicked or was cancelled: {err}"))??;
    debug!(task = %kind, written = report.written, skipped = report.skipped, "task report");
    Ok(())
}
