// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`executor_loop`](super::executor_loop).
//!
//! - `RealExecutorBackend` is the default implementation used by `sitepipe`.
//!   It wraps the executor loop and forwards scheduled steps over an mpsc
//!   channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which steps were scheduled and directly emits `StepCompleted` events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::ScheduledStep;
use crate::engine::RuntimeEvent;
use crate::errors::{Result, SitepipeError};
use crate::tasks::TaskContext;

use super::executor_loop::spawn_executor;
use super::long_lived::ServiceHost;

/// Trait abstracting how scheduled steps are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given steps for execution.
    ///
    /// Every dispatched step must eventually be answered with a
    /// `RuntimeEvent::StepCompleted`.
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledStep>,
}

impl RealExecutorBackend {
    /// Spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, ctx: TaskContext) -> Self {
        let services = Arc::new(ServiceHost::new(runtime_tx.clone()));
        let tx = spawn_executor(runtime_tx, ctx, services);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for step in steps {
                tx.send(step)
                    .await
                    .map_err(|err| SitepipeError::Other(anyhow::anyhow!("executor closed: {err}")))?;
            }
            Ok(())
        })
    }
}
