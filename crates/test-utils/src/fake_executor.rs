use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use sitepipe::dag::ScheduledStep;
use sitepipe::engine::{RuntimeEvent, StepOutcome};
use sitepipe::errors::Result;
use sitepipe::exec::ExecutorBackend;
use sitepipe::types::TaskKind;

/// A fake executor that:
/// - records which task kinds were "run", in dispatch order
/// - immediately reports StepCompleted for each scheduled step, failing the
///   kinds it was told to fail.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<TaskKind>>>,
    failing: HashSet<TaskKind>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<TaskKind>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, kind: TaskKind) -> Self {
        self.failing.insert(kind);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for s in steps {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(s.kind);
                }

                let outcome = if failing.contains(&s.kind) {
                    StepOutcome::Failed(format!("{} failed on purpose", s.kind))
                } else {
                    StepOutcome::Success
                };
                tx.send(RuntimeEvent::StepCompleted {
                    plan: s.plan.clone(),
                    run_id: s.run_id,
                    step: s.step,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
