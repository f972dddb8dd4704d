// src/dag/task_info.rs

//! Per-run step state and the dispatch descriptor handed to executors.

use crate::dag::graph::StepId;
use crate::types::TaskKind;

/// State of one step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Waiting on dependencies.
    Pending,
    /// Dispatched to the executor.
    Running,
    DoneSuccess,
    DoneFailed,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::DoneSuccess | StepState::DoneFailed)
    }
}

/// A step the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStep {
    pub plan: String,
    /// Monotonically increasing run identifier, unique per process.
    pub run_id: u64,
    pub step: StepId,
    pub kind: TaskKind,
}
