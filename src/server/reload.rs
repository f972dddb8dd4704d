// src/server/reload.rs

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

/// Message pushed to every connected browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload,
    /// Re-fetch the stylesheets served under these URL paths.
    Css { paths: Vec<String> },
}

/// Fan-out of reload messages to websocket clients.
///
/// Full reloads are debounced on both edges: the first request in a quiet
/// period goes out at once, later requests inside the window collapse into
/// one reload sent when the window closes.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadMessage>,
    window: Arc<Mutex<ReloadWindow>>,
    debounce: Duration,
}

#[derive(Debug, Default)]
struct ReloadWindow {
    last_sent: Option<Instant>,
    trailing: bool,
}

impl ReloadHub {
    pub fn new(debounce: Duration) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            window: Arc::new(Mutex::new(ReloadWindow::default())),
            debounce,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Ask every client to reload. Returns `false` when the reload was
    /// deferred to the end of the current debounce window.
    pub fn full_reload(&self) -> bool {
        let now = Instant::now();
        {
            let mut window = self.lock_window();
            if let Some(prev) = window.last_sent {
                let elapsed = now.duration_since(prev);
                if elapsed < self.debounce {
                    if !window.trailing {
                        window.trailing = true;
                        self.schedule_trailing(self.debounce - elapsed);
                    }
                    debug!("full reload deferred to the end of the debounce window");
                    return false;
                }
            }
            window.last_sent = Some(now);
        }
        self.send_reload();
        true
    }

    fn schedule_trailing(&self, delay: Duration) {
        let hub = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    hub.flush_trailing();
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    hub.flush_trailing();
                });
            }
        }
    }

    fn flush_trailing(&self) {
        {
            let mut window = self.lock_window();
            window.trailing = false;
            window.last_sent = Some(Instant::now());
        }
        self.send_reload();
    }

    fn send_reload(&self) {
        let clients = self.tx.send(ReloadMessage::Reload).unwrap_or(0);
        debug!(clients, "full reload sent");
    }

    fn lock_window(&self) -> MutexGuard<'_, ReloadWindow> {
        self.window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Swap the given stylesheets in place.
    pub fn inject_css(&self, paths: Vec<String>) {
        let clients = self.tx.send(ReloadMessage::Css { paths }).unwrap_or(0);
        debug!(clients, "stylesheet refresh sent");
    }
}
