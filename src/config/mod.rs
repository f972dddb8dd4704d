// src/config/mod.rs

//! Path configuration for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate patterns, paths and cleanup disjointness (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_config};
pub use model::{
    CleanSection, ConfigFile, ImagesSection, RawConfigFile, ScriptsSection, ServerSection,
    StylesSection, TemplatesSection, WatchSection,
};
