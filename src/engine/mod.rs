// src/engine/mod.rs

//! Orchestration engine for sitepipe.
//!
//! This module ties together:
//! - the per-run schedulers, one per active plan
//! - the trigger queue (what happens when a plan is triggered while it runs)
//! - the main runtime event loop that reacts to:
//!   - initial and file-watch plan triggers
//!   - step completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::StepId;

/// Outcome of a step for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    /// Failed, with the rendered error chain.
    Failed(String),
}

/// Why a plan was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The plan named on the command line.
    Manual,
    /// A watch registration matched changed paths.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no plan is running and nothing is
    /// queued (one-shot commands).
    pub exit_when_idle: bool,
    /// Maximum pending re-runs per plan.
    pub queue_length: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            exit_when_idle: false,
            queue_length: 1,
        }
    }
}

/// Events flowing into the runtime from the CLI, watcher and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A plan should run.
    PlanTriggered {
        plan: String,
        reason: TriggerReason,
    },
    /// A dispatched step finished.
    StepCompleted {
        plan: String,
        run_id: u64,
        step: StepId,
        outcome: StepOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::{CoreRuntime, PipelinePhase, RunReport, RunSummary};
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
