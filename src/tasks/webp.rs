// src/tasks/webp.rs

use std::time::SystemTime;

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use tracing::{debug, info};

use crate::tasks::{modified_since, FileFailures, TaskContext, TaskReport};
use crate::types::TaskKind;

/// Encode a JPEG or PNG as lossy WebP.
pub fn encode_webp(bytes: &[u8], quality: f32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("decoding image")?;
    let img = match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };
    let encoder = webp::Encoder::from_image(&img).map_err(|e| anyhow!("{e}"))?;
    Ok(encoder.encode(quality).to_vec())
}

/// Convert every raster image changed since the last successful run into
/// `images.dist_webp`.
pub fn convert_webp(ctx: &TaskContext, since: Option<SystemTime>) -> Result<TaskReport> {
    let cfg = &ctx.config.images;
    let dist = ctx.path(&cfg.dist_webp);
    let (files, skipped) = modified_since(ctx, ctx.sources(&cfg.src_webp)?, since);

    let mut report = TaskReport {
        skipped,
        ..TaskReport::default()
    };
    let mut failures = FileFailures::new(TaskKind::ConvertWebp);

    for file in files {
        let result = ctx
            .fs
            .read(&file.path)
            .and_then(|bytes| encode_webp(&bytes, cfg.webp_quality));
        let bytes = match result {
            Ok(b) => b,
            Err(err) => {
                failures.record(&file.path, err);
                continue;
            }
        };

        let out = dist.join(file.rel.with_extension("webp"));
        ctx.fs.write(&out, &bytes)?;
        debug!(file = ?file.rel, out = ?out, "webp written");
        report.written += 1;
    }

    info!(
        task = %TaskKind::ConvertWebp,
        images = report.written,
        unchanged = report.skipped,
        "webp conversion done"
    );
    failures.finish(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use crate::config::{ConfigFile, RawConfigFile};
    use crate::fs::mock::MockFileSystem;
    use crate::fs::FileSystem;
    use crate::tasks::images::tests::{sample_jpeg, sample_png};

    #[test]
    fn jpeg_and_png_end_up_as_webp() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/images/photo.jpg", sample_jpeg());
        fs.add_file("/site/src/images/icons/logo.png", sample_png());
        fs.add_file("/site/src/images/anim.gif", "GIF89a");

        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        let ctx = TaskContext::new("/site", Arc::new(cfg), Arc::new(fs.clone()));
        let report = convert_webp(&ctx, None).unwrap();

        assert_eq!(report.written, 2);
        let webp = fs
            .read(Path::new("/site/public/assets/images/webp/icons/logo.webp"))
            .unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
        assert!(fs.exists(Path::new("/site/public/assets/images/webp/photo.webp")));
        assert!(!fs.exists(Path::new("/site/public/assets/images/webp/anim.webp")));
    }
}
