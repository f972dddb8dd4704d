// src/exec/mod.rs

//! Step execution layer.
//!
//! This module runs the steps handed out by the schedulers and reports back
//! to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the executor loop and the one-instance-per-kind
//!   backlog.
//! - [`task_runner`] runs a single step: task bodies on the blocking pool,
//!   services through [`long_lived`].
//! - [`long_lived`] starts the file watcher and the dev server once.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod long_lived;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use long_lived::ServiceHost;
