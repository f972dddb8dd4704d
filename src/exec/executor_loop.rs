// src/exec/executor_loop.rs

//! Main executor loop.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledStep;
use crate::engine::RuntimeEvent;
use crate::exec::long_lived::ServiceHost;
use crate::exec::task_runner::run_step;
use crate::tasks::TaskContext;
use crate::types::TaskKind;

/// Spawn the background executor loop.
///
/// Each scheduled step runs in its own Tokio task, and **per task kind there
/// is never more than one instance running at the same time**: a step whose
/// kind is busy waits in a backlog until the running instance finishes.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: TaskContext,
    services: Arc<ServiceHost>,
) -> mpsc::Sender<ScheduledStep> {
    let (tx, mut rx) = mpsc::channel::<ScheduledStep>(32);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<TaskKind>();

    tokio::spawn(async move {
        info!("executor loop started");

        let mut busy: HashSet<TaskKind> = HashSet::new();
        let mut backlog: VecDeque<ScheduledStep> = VecDeque::new();

        let start = |step: ScheduledStep, busy: &mut HashSet<TaskKind>| {
            busy.insert(step.kind);
            let ctx = ctx.clone();
            let services = Arc::clone(&services);
            let runtime_tx = runtime_tx.clone();
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let kind = step.kind;
                run_step(step, ctx, services, runtime_tx).await;
                let _ = done_tx.send(kind);
            });
        };

        loop {
            tokio::select! {
                step = rx.recv() => {
                    let Some(step) = step else { break };
                    if busy.contains(&step.kind) {
                        debug!(
                            task = %step.kind,
                            plan = %step.plan,
                            run_id = step.run_id,
                            "task kind busy; step waits in backlog"
                        );
                        backlog.push_back(step);
                    } else {
                        start(step, &mut busy);
                    }
                }

                Some(kind) = done_rx.recv() => {
                    busy.remove(&kind);
                    if let Some(idx) = backlog.iter().position(|s| s.kind == kind) {
                        if let Some(step) = backlog.remove(idx) {
                            debug!(task = %step.kind, plan = %step.plan, "starting backlogged step");
                            start(step, &mut busy);
                        }
                    }
                }
            }
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
