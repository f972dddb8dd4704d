// src/exec/long_lived.rs

//! Long-lived services: the file watcher and the dev server.
//!
//! A service step completes once the service is up. Starting a service that
//! is already running succeeds without doing anything.

use std::net::SocketAddr;
use std::sync::Mutex;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::RuntimeEvent;
use crate::server::spawn_server;
use crate::tasks::TaskContext;
use crate::types::TaskKind;
use crate::watch::{build_registrations, spawn_watcher, WatcherHandle};

#[derive(Debug)]
pub struct ServiceHost {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    watcher: Mutex<Option<WatcherHandle>>,
    server: Mutex<Option<(SocketAddr, JoinHandle<()>)>>,
}

impl ServiceHost {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            watcher: Mutex::new(None),
            server: Mutex::new(None),
        }
    }

    pub async fn start(&self, kind: TaskKind, ctx: &TaskContext) -> Result<()> {
        match kind {
            TaskKind::WatchFiles => self.start_watcher(ctx),
            TaskKind::ServeSite => self.start_server(ctx).await,
            other => bail!("{other} is not a service"),
        }
    }

    /// Address the dev server is bound to, once started.
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|(addr, _)| *addr)
    }

    fn start_watcher(&self, ctx: &TaskContext) -> Result<()> {
        let mut slot = self
            .watcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            debug!("file watcher already running");
            return Ok(());
        }

        let registrations = build_registrations(&ctx.config)?;
        let handle = spawn_watcher(
            ctx.root.clone(),
            registrations,
            self.runtime_tx.clone(),
            ctx.config.watch.debounce(),
        )?;
        *slot = Some(handle);
        Ok(())
    }

    async fn start_server(&self, ctx: &TaskContext) -> Result<()> {
        if self.server_addr().is_some() {
            debug!("dev server already running");
            return Ok(());
        }

        let (addr, handle) = spawn_server(ctx).await?;
        info!(addr = %addr, "dev server started");
        *self
            .server
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some((addr, handle));
        Ok(())
    }
}
