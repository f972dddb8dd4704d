// src/dag/state_manager.rs

//! Per-run state transitions for the steps of one plan run.

use tracing::{debug, info};

use crate::dag::graph::{StepGraph, StepId};
use crate::dag::task_info::{ScheduledStep, StepState};

/// Manages per-run state transitions for steps.
pub struct StateManager<'a> {
    graph: &'a StepGraph,
    states: &'a mut [StepState],
    plan: &'a str,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a StepGraph,
        states: &'a mut [StepState],
        plan: &'a str,
        run_id: u64,
    ) -> Self {
        Self {
            graph,
            states,
            plan,
            run_id,
        }
    }

    /// A step may start once every dependency is terminal.
    ///
    /// A failed dependency still counts: failures are reported and the rest
    /// of the run carries on.
    pub fn deps_satisfied(&self, step: StepId) -> bool {
        self.graph
            .deps_of(step)
            .iter()
            .all(|dep| self.states[*dep].is_terminal())
    }

    /// Collect steps that are `Pending` with satisfied dependencies, mark them
    /// as `Running`, and return them as `ScheduledStep`s.
    pub fn collect_new_ready_steps(&mut self) -> Vec<ScheduledStep> {
        let candidates: Vec<StepId> = self
            .graph
            .steps()
            .filter(|s| self.states[*s] == StepState::Pending && self.deps_satisfied(*s))
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for step in candidates {
            let kind = self.graph.kind(step);
            let upstream_failed = self
                .graph
                .deps_of(step)
                .iter()
                .any(|d| self.states[*d] == StepState::DoneFailed);

            if upstream_failed {
                info!(
                    plan = %self.plan,
                    run_id = self.run_id,
                    task = %kind,
                    "scheduling step although an earlier step failed"
                );
            } else {
                debug!(
                    plan = %self.plan,
                    run_id = self.run_id,
                    task = %kind,
                    "dependencies satisfied; marking Running"
                );
            }

            self.states[step] = StepState::Running;
            ready.push(ScheduledStep {
                plan: self.plan.to_string(),
                run_id: self.run_id,
                step,
                kind,
            });
        }

        ready
    }

    pub fn all_steps_terminal(&self) -> bool {
        self.states.iter().all(|s| s.is_terminal())
    }
}
