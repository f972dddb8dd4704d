// src/dag/mod.rs

//! Plan composition and scheduling.
//!
//! - [`plan`] holds the `series` / `parallel` combinators.
//! - [`graph`] is the compiled step graph (petgraph).
//! - [`plans`] names the built-in plans.
//! - [`scheduler`] contains the per-run state machine that decides
//!   which steps are ready to run.
//! - [`task_info`] provides step states and scheduled step types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod plan;
pub mod plans;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::{StepGraph, StepId};
pub use plan::{parallel, series, task, Plan};
pub use plans::PlanBook;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledStep, StepState};
