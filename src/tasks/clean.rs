// src/tasks/clean.rs

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::tasks::{TaskContext, TaskReport};

fn remove(ctx: &TaskContext, rel: &Path, report: &mut TaskReport) -> Result<()> {
    let path = ctx.path(rel);
    let removed = ctx
        .fs
        .remove_path(&path)
        .with_context(|| format!("removing {:?}", path))?;
    if removed {
        debug!(path = ?path, "removed");
        report.written += 1;
    } else {
        report.skipped += 1;
    }
    Ok(())
}

/// Remove the whole output directory.
pub fn clean_all(ctx: &TaskContext) -> Result<TaskReport> {
    let mut report = TaskReport::default();
    remove(ctx, &ctx.config.clean.all, &mut report)?;
    info!(path = ?ctx.config.clean.all, "output removed");
    Ok(report)
}

/// Remove every entry directly under the output directory except the kept
/// names.
pub fn clean_exclude_html(ctx: &TaskContext) -> Result<TaskReport> {
    let cfg = &ctx.config.clean;
    let dir = ctx.path(&cfg.all);
    let mut report = TaskReport::default();
    if !ctx.fs.is_dir(&dir) {
        info!(path = ?cfg.all, "nothing to clean");
        return Ok(report);
    }

    for entry in ctx.fs.read_dir(&dir)? {
        let keep = entry
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| cfg.keep.iter().any(|k| k == n));
        if keep {
            continue;
        }
        let removed = ctx.fs.remove_path(&entry)?;
        if removed {
            debug!(path = ?entry, "removed");
            report.written += 1;
        }
    }
    info!(path = ?cfg.all, kept = ?cfg.keep, removed = report.written, "output cleaned");
    Ok(report)
}

/// Remove the compiled style and script directories.
pub fn clean_css_js(ctx: &TaskContext) -> Result<TaskReport> {
    let mut report = TaskReport::default();
    for rel in &ctx.config.clean.assets {
        remove(ctx, rel, &mut report)?;
    }
    info!(targets = ?ctx.config.clean.assets, "styles and scripts removed");
    Ok(report)
}

/// Remove the generated image directory.
pub fn clean_images(ctx: &TaskContext) -> Result<TaskReport> {
    let mut report = TaskReport::default();
    remove(ctx, &ctx.config.clean.images, &mut report)?;
    info!(path = ?ctx.config.clean.images, "images removed");
    Ok(report)
}
