// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::graph::StepId;
use crate::dag::task_info::ScheduledStep;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step a run and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Steps that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledStep>,
    /// Steps newly marked as failed in this step.
    pub newly_failed: Vec<StepId>,
    /// Whether every step of the run is now terminal.
    pub run_just_finished: bool,
}
