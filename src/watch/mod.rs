// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Compiling one pattern list per watched asset kind ([`WatchRegistration`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Debouncing bursts of events into batches.
//!
//! It does **not** run anything itself; it only turns filesystem changes into
//! plan triggers for the runtime.

pub mod event_handler;
pub mod path_utils;
pub mod registrations;
pub mod watcher;

pub use registrations::{build_registrations, WatchRegistration};
pub use watcher::{spawn_watcher, WatcherHandle};
