// src/tasks/vendor.rs

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::sources::SourceSet;
use crate::tasks::{TaskContext, TaskReport};
use crate::types::TaskKind;

pub fn copy_vendor_styles(ctx: &TaskContext) -> Result<TaskReport> {
    let cfg = &ctx.config.styles;
    copy_vendor(ctx, &cfg.copy, &cfg.dist_copy, TaskKind::CopyVendorStyles)
}

pub fn copy_vendor_scripts(ctx: &TaskContext) -> Result<TaskReport> {
    let cfg = &ctx.config.scripts;
    copy_vendor(ctx, &cfg.copy, &cfg.dist, TaskKind::CopyVendorScripts)
}

/// Copy vendor files verbatim, keeping their path below the pattern base.
///
/// An absent, unreadable or empty vendor folder is not an error.
fn copy_vendor(
    ctx: &TaskContext,
    patterns: &[String],
    dest: &Path,
    kind: TaskKind,
) -> Result<TaskReport> {
    let set = SourceSet::new(patterns)?;
    let bases: Vec<_> = set.bases().into_iter().map(|b| ctx.path(b)).collect();
    if !bases.iter().any(|b| ctx.fs.exists(b)) {
        warn!(task = %kind, bases = ?bases, "vendors folder not found, skipping copy");
        return Ok(TaskReport::default());
    }

    let files = match set.collect(ctx.fs.as_ref(), &ctx.root) {
        Ok(files) => files,
        Err(err) => {
            warn!(task = %kind, "could not read vendors folder: {err:#}");
            return Ok(TaskReport::default());
        }
    };
    if files.is_empty() {
        info!(task = %kind, "no files in vendors folder, skipping copy");
        return Ok(TaskReport::default());
    }

    let dest = ctx.path(dest);
    let mut report = TaskReport::default();
    for file in files {
        let out = dest.join(&file.rel);
        ctx.fs.copy(&file.path, &out)?;
        debug!(task = %kind, file = ?file.rel, out = ?out, "vendor file copied");
        report.written += 1;
    }

    info!(task = %kind, files = report.written, "vendor files copied");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{ConfigFile, RawConfigFile};
    use crate::fs::mock::MockFileSystem;
    use crate::fs::FileSystem;

    fn ctx(fs: &MockFileSystem) -> TaskContext {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        TaskContext::new("/site", Arc::new(cfg), Arc::new(fs.clone()))
    }

    #[test]
    fn missing_folder_is_success() {
        let fs = MockFileSystem::new();
        let report = copy_vendor_styles(&ctx(&fs)).unwrap();
        assert_eq!(report.written, 0);
    }

    #[test]
    fn empty_folder_is_success() {
        let fs = MockFileSystem::new();
        fs.add_dir("/site/src/css/vendors");
        fs.add_dir("/site/src/js/vendors");
        assert_eq!(copy_vendor_styles(&ctx(&fs)).unwrap().written, 0);
        assert_eq!(copy_vendor_scripts(&ctx(&fs)).unwrap().written, 0);
    }

    #[test]
    fn populated_folders_are_copied_verbatim() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/css/vendors/normalize.css", "html{margin:0}");
        fs.add_file("/site/src/js/vendors/jquery.js", "/*! jq */ var $;");

        assert_eq!(copy_vendor_styles(&ctx(&fs)).unwrap().written, 1);
        assert_eq!(copy_vendor_scripts(&ctx(&fs)).unwrap().written, 1);
        assert_eq!(
            fs.read_to_string(Path::new("/site/public/assets/css/vendors/normalize.css"))
                .unwrap(),
            "html{margin:0}"
        );
        assert_eq!(
            fs.read_to_string(Path::new("/site/public/assets/js/vendors/jquery.js"))
                .unwrap(),
            "/*! jq */ var $;"
        );
    }
}
