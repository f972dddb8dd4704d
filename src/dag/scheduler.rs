// src/dag/scheduler.rs

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::dag::graph::{StepGraph, StepId};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::StepState;
use crate::engine::StepOutcome;

/// Per-run state machine for one plan.
///
/// It is responsible for:
/// - dispatching the root steps when the run starts
/// - marking steps as succeeded/failed on completion
/// - scheduling dependents once all of their dependencies are terminal
/// - reporting when every step of the run is terminal
#[derive(Debug)]
pub struct Scheduler {
    plan: String,
    graph: Arc<StepGraph>,
    run_id: u64,
    states: Vec<StepState>,
    failed: usize,
    started: bool,
}

impl Scheduler {
    pub fn new(plan: impl Into<String>, graph: Arc<StepGraph>, run_id: u64) -> Self {
        let states = vec![StepState::Pending; graph.len()];
        Self {
            plan: plan.into(),
            graph,
            run_id,
            states,
            failed: 0,
            started: false,
        }
    }

    pub fn plan(&self) -> &str {
        &self.plan
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    /// Number of steps that failed so far in this run.
    pub fn failed_count(&self) -> usize {
        self.failed
    }

    pub fn state_of(&self, step: StepId) -> Option<StepState> {
        self.states.get(step).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.states.iter().all(|s| s.is_terminal())
    }

    /// Start the run: every step without dependencies becomes ready.
    ///
    /// An empty plan finishes immediately.
    pub fn start(&mut self) -> SchedulerStep {
        if self.started {
            warn!(plan = %self.plan, run_id = self.run_id, "run already started; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;
        info!(
            plan = %self.plan,
            run_id = self.run_id,
            steps = self.graph.len(),
            "starting plan run"
        );

        let graph = Arc::clone(&self.graph);
        let mut manager = StateManager::new(&graph, &mut self.states, &self.plan, self.run_id);
        let newly_scheduled = manager.collect_new_ready_steps();
        let run_just_finished = manager.all_steps_terminal();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    /// Handle completion of a running step.
    pub fn handle_completion(&mut self, step: StepId, outcome: StepOutcome) -> SchedulerStep {
        match self.states.get(step).copied() {
            Some(StepState::Running) => {}
            Some(other) => {
                warn!(
                    plan = %self.plan,
                    run_id = self.run_id,
                    step,
                    state = ?other,
                    "completion for a step that is not running; ignoring"
                );
                return SchedulerStep::default();
            }
            None => {
                warn!(plan = %self.plan, run_id = self.run_id, step, "completion for unknown step; ignoring");
                return SchedulerStep::default();
            }
        }

        let kind = self.graph.kind(step);
        let mut newly_failed = Vec::new();

        match outcome {
            StepOutcome::Success => {
                self.states[step] = StepState::DoneSuccess;
                debug!(plan = %self.plan, run_id = self.run_id, task = %kind, "step completed successfully");
            }
            StepOutcome::Failed(reason) => {
                self.states[step] = StepState::DoneFailed;
                self.failed += 1;
                newly_failed.push(step);
                error!(
                    plan = %self.plan,
                    run_id = self.run_id,
                    task = %kind,
                    error = %reason,
                    "step failed; continuing with the rest of the run"
                );
            }
        }

        let graph = Arc::clone(&self.graph);
        let mut manager = StateManager::new(&graph, &mut self.states, &self.plan, self.run_id);
        let newly_scheduled = manager.collect_new_ready_steps();
        let run_just_finished = manager.all_steps_terminal();

        if run_just_finished {
            info!(
                plan = %self.plan,
                run_id = self.run_id,
                failed = self.failed,
                "all steps terminal; run finished"
            );
        }

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::plan::{parallel, series, task};
    use crate::types::TaskKind::*;

    fn kinds(step: &SchedulerStep) -> Vec<crate::types::TaskKind> {
        let mut k: Vec<_> = step.newly_scheduled.iter().map(|s| s.kind).collect();
        k.sort();
        k
    }

    #[test]
    fn series_waits_for_previous_member() {
        let graph = Arc::new(series([task(CompressImages), task(ConvertWebp), task(ReloadBrowser)]).compile());
        let mut s = Scheduler::new("watch:images", graph, 1);

        let step = s.start();
        assert_eq!(kinds(&step), vec![CompressImages]);

        let images = step.newly_scheduled[0].step;
        let step = s.handle_completion(images, StepOutcome::Success);
        assert_eq!(kinds(&step), vec![ConvertWebp]);
        assert!(!step.run_just_finished);
    }

    #[test]
    fn failure_does_not_block_dependents() {
        let graph = Arc::new(series([task(RenderTemplates), task(ReloadBrowser)]).compile());
        let mut s = Scheduler::new("watch:templates", graph, 7);

        let first = s.start().newly_scheduled[0].step;
        let step = s.handle_completion(first, StepOutcome::Failed("bad data".into()));
        assert_eq!(step.newly_failed, vec![first]);
        assert_eq!(kinds(&step), vec![ReloadBrowser]);

        let reload = step.newly_scheduled[0].step;
        let step = s.handle_completion(reload, StepOutcome::Success);
        assert!(step.run_just_finished);
        assert_eq!(s.failed_count(), 1);
    }

    #[test]
    fn parallel_members_start_together() {
        let graph = Arc::new(parallel([task(CompileStyles), task(CompileScripts), task(RenderTemplates)]).compile());
        let mut s = Scheduler::new("p", graph, 1);
        assert_eq!(kinds(&s.start()), vec![RenderTemplates, CompileStyles, CompileScripts]);
    }

    #[test]
    fn duplicate_completion_is_ignored() {
        let graph = Arc::new(task(CleanAll).compile());
        let mut s = Scheduler::new("cleanAll", graph, 1);
        let step = s.start().newly_scheduled[0].step;
        assert!(s.handle_completion(step, StepOutcome::Success).run_just_finished);
        let again = s.handle_completion(step, StepOutcome::Success);
        assert!(!again.run_just_finished);
        assert!(again.newly_scheduled.is_empty());
    }
}
