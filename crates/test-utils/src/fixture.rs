use std::path::{Path, PathBuf};
use std::sync::Arc;

use sitepipe::config::ConfigFile;
use sitepipe::fs::RealFileSystem;
use sitepipe::tasks::TaskContext;
use tempfile::TempDir;

use crate::builders::ConfigFileBuilder;

/// A throwaway project directory on the real filesystem.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("creating parent dirs");
        }
        std::fs::write(&path, contents).expect("writing fixture file");
        path
    }

    pub fn mkdir(&self, rel: &str) {
        std::fs::create_dir_all(self.path(rel)).expect("creating fixture dir");
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("reading fixture file")
    }

    /// Every file below `rel`, relative to it, slash-separated and sorted.
    pub fn files_under(&self, rel: &str) -> Vec<String> {
        let base = self.path(rel);
        let mut out = Vec::new();
        let mut stack = vec![base.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(r) = path.strip_prefix(&base) {
                    out.push(r.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    pub fn context(&self) -> TaskContext {
        self.context_with(ConfigFileBuilder::new().build())
    }

    pub fn context_with(&self, cfg: ConfigFile) -> TaskContext {
        TaskContext::new(self.root(), Arc::new(cfg), Arc::new(RealFileSystem))
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}
