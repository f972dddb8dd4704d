// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledStep`s to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem or task
//! bodies.

use std::collections::BTreeMap;

use tracing::info;

use crate::dag::plans::DEFAULT_PLAN;
use crate::dag::{PlanBook, Scheduler};
use crate::engine::event_handlers::CoreStep;
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};

/// Lifecycle of the `default` plan.
///
/// `Idle → InitialBuild → Watching`; there is no way back short of
/// terminating the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    InitialBuild,
    Watching,
}

/// Result of one finished plan run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub plan: String,
    pub run_id: u64,
    pub steps: usize,
    pub failed: usize,
}

/// Every run finished during the lifetime of a runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub runs: Vec<RunReport>,
}

impl RunSummary {
    pub fn failed_steps(&self) -> usize {
        self.runs.iter().map(|r| r.failed).sum()
    }

    pub fn runs_of<'a>(&'a self, plan: &'a str) -> impl Iterator<Item = &'a RunReport> + 'a {
        self.runs.iter().filter(move |r| r.plan == plan)
    }
}

/// Pure core runtime state.
///
/// This owns:
/// - the compiled plans
/// - one scheduler per currently running plan
/// - the trigger queue
/// - runtime options (e.g. `exit_when_idle`)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    pub(super) plans: PlanBook,
    pub(super) active: BTreeMap<String, Scheduler>,
    pub(super) queue: TriggerQueue,
    pub(super) options: RuntimeOptions,
    pub(super) run_counter: u64,
    pub(super) phase: PipelinePhase,
    pub(super) summary: RunSummary,
}

impl CoreRuntime {
    pub fn new(plans: PlanBook, options: RuntimeOptions) -> Self {
        Self {
            plans,
            active: BTreeMap::new(),
            queue: TriggerQueue::new(options.queue_length),
            options,
            run_counter: 0,
            phase: PipelinePhase::Idle,
            summary: RunSummary::default(),
        }
    }

    /// True if no plan is running.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_running(&self, plan: &str) -> bool {
        self.active.contains_key(plan)
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::PlanTriggered { plan, reason } => self.handle_plan_trigger(plan, reason),
            RuntimeEvent::StepCompleted {
                plan,
                run_id,
                step,
                outcome,
            } => self.handle_step_completion(plan, run_id, step, outcome),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    pub(super) fn next_run_id(&mut self) -> u64 {
        self.run_counter += 1;
        self.run_counter
    }

    pub(super) fn note_run_started(&mut self, plan: &str) {
        if plan == DEFAULT_PLAN && self.phase == PipelinePhase::Idle {
            self.enter(PipelinePhase::InitialBuild);
        }
    }

    pub(super) fn note_run_finished(&mut self, plan: &str) {
        if plan == DEFAULT_PLAN && self.phase == PipelinePhase::InitialBuild {
            self.enter(PipelinePhase::Watching);
        }
    }

    fn enter(&mut self, next: PipelinePhase) {
        info!(from = ?self.phase, to = ?next, "pipeline phase changed");
        self.phase = next;
    }
}
