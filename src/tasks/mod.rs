// src/tasks/mod.rs

//! Task bodies.
//!
//! Every function here is synchronous and CPU/IO bound; the executor runs
//! them on Tokio's blocking pool. All filesystem access goes through
//! [`TaskContext::fs`].

use std::time::SystemTime;

use anyhow::{bail, Result};
use tracing::debug;

use crate::types::TaskKind;

pub mod clean;
pub mod context;
pub mod html;
pub mod images;
pub mod scripts;
pub mod styles;
pub mod svg;
pub mod templates;
pub mod vendor;
pub mod webp;
pub use context::{FileFailures, LastRunRecord, TaskContext, TaskReport};

/// Run the body of a non-service task.
///
/// Since-gated tasks record their start time on success, so files modified
/// while they ran are picked up next time.
pub fn run_task(kind: TaskKind, ctx: &TaskContext) -> Result<TaskReport> {
    let started = SystemTime::now();
    let since = if kind.is_since_gated() {
        ctx.last_run.get(kind)
    } else {
        None
    };

    let report = match kind {
        TaskKind::RenderTemplates => templates::render_templates(ctx)?,
        TaskKind::CompileStyles => styles::compile_styles(ctx)?,
        TaskKind::CopyVendorStyles => vendor::copy_vendor_styles(ctx)?,
        TaskKind::CompileScripts => scripts::compile_scripts(ctx)?,
        TaskKind::CopyVendorScripts => vendor::copy_vendor_scripts(ctx)?,
        TaskKind::CompressImages => images::compress_images(ctx, since)?,
        TaskKind::ConvertWebp => webp::convert_webp(ctx, since)?,
        TaskKind::CleanAll => clean::clean_all(ctx)?,
        TaskKind::CleanExcludeHtml => clean::clean_exclude_html(ctx)?,
        TaskKind::CleanCssJs => clean::clean_css_js(ctx)?,
        TaskKind::CleanImages => clean::clean_images(ctx)?,
        TaskKind::ReloadBrowser => {
            ctx.reload.full_reload();
            TaskReport::default()
        }
        TaskKind::WatchFiles | TaskKind::ServeSite => {
            bail!("{kind} is a service and has no task body")
        }
    };

    if kind.is_since_gated() {
        debug!(task = %kind, "recording last successful run");
        ctx.last_run.record(kind, started);
    }

    Ok(report)
}

/// Keep only files modified after `since`. Files whose time cannot be read
/// are kept.
pub(crate) fn modified_since(
    ctx: &TaskContext,
    files: Vec<crate::sources::SourceFile>,
    since: Option<SystemTime>,
) -> (Vec<crate::sources::SourceFile>, usize) {
    let Some(since) = since else {
        return (files, 0);
    };
    let before = files.len();
    let kept: Vec<_> = files
        .into_iter()
        .filter(|f| match ctx.fs.modified(&f.path) {
            Ok(modified) => modified > since,
            Err(_) => true,
        })
        .collect();
    let skipped = before - kept.len();
    (kept, skipped)
}
