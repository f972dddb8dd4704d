// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledStep;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::{CoreRuntime, RunSummary};
use super::{CoreCommand, RuntimeEvent};

/// Drives the plan schedulers in response to `RuntimeEvent`s,
/// and delegates actual step execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels and dispatching steps to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (dispatch steps, exit).
    ///
    /// Returns every run that finished while the loop was alive.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("sitepipe runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(self.core.into_summary())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchSteps(steps) => {
                self.dispatch(steps).await?;
            }
            CoreCommand::RunFinished(report) => {
                debug!(
                    plan = %report.plan,
                    run_id = report.run_id,
                    failed = report.failed,
                    "run finished"
                );
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, steps: Vec<ScheduledStep>) -> Result<()> {
        if steps.is_empty() {
            return Ok(());
        }

        let kinds: Vec<_> = steps.iter().map(|s| s.kind.name()).collect();
        debug!(?kinds, run_id = steps[0].run_id, plan = %steps[0].plan, "dispatching ready steps");

        self.executor.spawn_ready_steps(steps).await
    }
}
