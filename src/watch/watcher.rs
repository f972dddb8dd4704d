// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::RuntimeEvent;
use crate::watch::event_handler::forward_batch;
use crate::watch::registrations::WatchRegistration;

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    forwarder: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

fn is_relevant(event: &Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
}

/// Watch `root` recursively and send a `PlanTriggered` for every
/// registration matching a debounced batch of changes.
///
/// A batch closes once no event has arrived for `debounce`.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    registrations: Vec<WatchRegistration>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    debounce: Duration,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());
    let registrations = Arc::new(registrations);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    eprintln!("sitepipe: watcher channel closed, dropping event");
                }
            }
            Err(err) => {
                eprintln!("sitepipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(
        root = ?root,
        registrations = registrations.len(),
        debounce_ms = debounce.as_millis() as u64,
        "file watcher started"
    );

    let forwarder = tokio::spawn(async move {
        while let Some(first) = event_rx.recv().await {
            let mut paths = Vec::new();
            if is_relevant(&first) {
                paths.extend(first.paths);
            }

            loop {
                match tokio::time::timeout(debounce, event_rx.recv()).await {
                    Ok(Some(event)) => {
                        if is_relevant(&event) {
                            paths.extend(event.paths);
                        }
                    }
                    Ok(None) => break,
                    Err(_) => break,
                }
            }

            if paths.is_empty() {
                continue;
            }
            paths.sort();
            paths.dedup();
            debug!(count = paths.len(), "change batch");

            if !forward_batch(&root, &paths, &registrations, &runtime_tx).await {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        forwarder,
    })
}
