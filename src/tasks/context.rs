// src/tasks/context.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::{error, warn};

use crate::config::ConfigFile;
use crate::fs::FileSystem;
use crate::server::ReloadHub;
use crate::sources::{SourceFile, SourceSet};
use crate::types::TaskKind;
use crate::watch::path_utils::slash_path;

/// Everything a task body needs. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Project root; every configured path is relative to it.
    pub root: PathBuf,
    pub config: Arc<ConfigFile>,
    pub fs: Arc<dyn FileSystem>,
    pub last_run: LastRunRecord,
    pub reload: ReloadHub,
}

impl TaskContext {
    pub fn new(root: impl Into<PathBuf>, config: Arc<ConfigFile>, fs: Arc<dyn FileSystem>) -> Self {
        let reload = ReloadHub::new(config.server.reload_debounce());
        Self {
            root: root.into(),
            config,
            fs,
            last_run: LastRunRecord::default(),
            reload,
        }
    }

    /// Resolve a configured relative path against the project root.
    pub fn path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Compile a pattern list and collect the files it selects.
    pub fn sources(&self, patterns: &[String]) -> anyhow::Result<Vec<SourceFile>> {
        let set = SourceSet::new(patterns)?;
        set.collect(self.fs.as_ref(), &self.root)
    }

    /// URL under which the dev server exposes an output file.
    pub fn url_for(&self, abs: &Path) -> Option<String> {
        let served = self.root.join(&self.config.server.base_dir);
        let rel = abs.strip_prefix(&served).ok()?;
        Some(format!("/{}", slash_path(rel)))
    }
}

/// Start time of each gated task's last successful run.
#[derive(Debug, Clone, Default)]
pub struct LastRunRecord {
    inner: Arc<Mutex<HashMap<TaskKind, SystemTime>>>,
}

impl LastRunRecord {
    pub fn get(&self, kind: TaskKind) -> Option<SystemTime> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&kind)
            .copied()
    }

    pub fn record(&self, kind: TaskKind, started: SystemTime) {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(kind, started);
    }
}

/// Outcome counters of one task body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub written: usize,
    pub skipped: usize,
}

/// Collects per-file failures so the remaining files can still be processed.
#[derive(Debug)]
pub struct FileFailures {
    task: TaskKind,
    failed: Vec<String>,
}

impl FileFailures {
    pub fn new(task: TaskKind) -> Self {
        Self {
            task,
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, file: &Path, err: anyhow::Error) {
        error!(task = %self.task, file = ?file, "{err:#}");
        self.failed.push(file.display().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }

    /// `Ok(report)` when every file went through, a summary error otherwise.
    pub fn finish(self, report: TaskReport) -> anyhow::Result<TaskReport> {
        if self.failed.is_empty() {
            return Ok(report);
        }
        if report.written > 0 {
            warn!(task = %self.task, written = report.written, "some files were still written");
        }
        anyhow::bail!(
            "{} file(s) failed: {}",
            self.failed.len(),
            self.failed.join(", ")
        )
    }
}
