// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::dag::{ScheduledStep, Scheduler, SchedulerStep, StepId};
use crate::engine::core::{CoreRuntime, RunReport};
use crate::engine::{StepOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these steps to the executor.
    DispatchSteps(Vec<ScheduledStep>),
    /// A plan run reached a terminal state.
    RunFinished(RunReport),
    /// Request that the process exits (one-shot commands when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreRuntime {
    /// Handle a plan trigger.
    ///
    /// - Unknown plans are ignored with a warning.
    /// - If the plan is already running the trigger is queued (or coalesced
    ///   into an already queued rerun).
    /// - Otherwise a new run starts immediately, next to any other running
    ///   plans.
    pub(super) fn handle_plan_trigger(&mut self, plan: String, reason: TriggerReason) -> CoreStep {
        let mut commands = Vec::new();

        if !self.plans.contains(&plan) {
            warn!(plan = %plan, ?reason, "trigger for unknown plan; ignoring");
        } else if self.active.contains_key(&plan) {
            debug!(plan = %plan, ?reason, "plan already running; queueing trigger");
            self.queue.record_trigger(&plan);
        } else {
            info!(plan = %plan, ?reason, "plan triggered");
            self.start_run(&plan, &mut commands);
        }

        self.finish_step(commands)
    }

    /// Handle a step completion.
    pub(super) fn handle_step_completion(
        &mut self,
        plan: String,
        run_id: u64,
        step: StepId,
        outcome: StepOutcome,
    ) -> CoreStep {
        let mut commands = Vec::new();

        let result = match self.active.get_mut(&plan) {
            Some(scheduler) if scheduler.run_id() == run_id => {
                Some(scheduler.handle_completion(step, outcome))
            }
            Some(scheduler) => {
                warn!(
                    plan = %plan,
                    run_id,
                    active_run = scheduler.run_id(),
                    "completion for a stale run; ignoring"
                );
                None
            }
            None => {
                warn!(plan = %plan, run_id, "completion for a plan that is not running; ignoring");
                None
            }
        };

        if let Some(sched_step) = result {
            self.apply(&plan, sched_step, &mut commands);
        }

        self.finish_step(commands)
    }

    fn start_run(&mut self, plan: &str, commands: &mut Vec<CoreCommand>) {
        let graph = match self.plans.get(plan) {
            Ok(g) => g,
            Err(err) => {
                warn!(plan = %plan, error = %err, "cannot start run");
                return;
            }
        };

        let run_id = self.next_run_id();
        let mut scheduler = Scheduler::new(plan, graph, run_id);
        let sched_step = scheduler.start();
        self.active.insert(plan.to_string(), scheduler);
        self.note_run_started(plan);

        self.apply(plan, sched_step, commands);
    }

    /// Turn a scheduler step into commands, retiring the run when it is done
    /// and starting a queued rerun if one is pending.
    fn apply(&mut self, plan: &str, sched_step: SchedulerStep, commands: &mut Vec<CoreCommand>) {
        if !sched_step.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchSteps(sched_step.newly_scheduled));
        }

        if !sched_step.run_just_finished {
            return;
        }

        if let Some(done) = self.active.remove(plan) {
            let report = RunReport {
                plan: plan.to_string(),
                run_id: done.run_id(),
                steps: done.graph().len(),
                failed: done.failed_count(),
            };
            if report.failed > 0 {
                warn!(
                    plan = %plan,
                    run_id = report.run_id,
                    failed = report.failed,
                    "plan run finished with failures"
                );
            } else {
                info!(plan = %plan, run_id = report.run_id, "plan run finished");
            }
            self.summary.runs.push(report.clone());
            commands.push(CoreCommand::RunFinished(report));
            self.note_run_finished(plan);
        }

        if self.queue.take(plan) {
            info!(plan = %plan, "starting queued re-run");
            self.start_run(plan, commands);
        }
    }

    /// In one-shot mode the runtime exits once no plan is running and no
    /// rerun is queued.
    fn finish_step(&self, mut commands: Vec<CoreCommand>) -> CoreStep {
        let mut keep_running = true;
        if self.options.exit_when_idle && self.is_idle() && self.queue.is_empty() {
            keep_running = false;
            commands.push(CoreCommand::RequestExit);
        }
        CoreStep {
            commands,
            keep_running,
        }
    }
}
