// src/tasks/images.rs

use std::io::Cursor;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, info};

use crate::tasks::{modified_since, svg, FileFailures, TaskContext, TaskReport};
use crate::types::TaskKind;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Decode and re-encode a JPEG at `quality`.
pub fn recompress_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("decoding JPEG")?;
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&img.to_rgb8())
        .context("encoding JPEG")?;
    Ok(out)
}

/// Quantize a PNG to an indexed palette within `[min, target]` quality.
///
/// Returns `None` when the minimum quality cannot be reached.
pub fn quantize_png(bytes: &[u8], quality: [u8; 2]) -> Result<Option<Vec<u8>>> {
    let rgba = image::load_from_memory(bytes)
        .context("decoding PNG")?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<imagequant::RGBA> = rgba
        .pixels()
        .map(|p| imagequant::RGBA::new(p[0], p[1], p[2], p[3]))
        .collect();

    let mut attrs = imagequant::new();
    attrs
        .set_quality(quality[0], quality[1])
        .map_err(|e| anyhow!("{e}"))?;
    let mut img = attrs
        .new_image(pixels, width as usize, height as usize, 0.0)
        .map_err(|e| anyhow!("{e}"))?;

    let mut quantized = match attrs.quantize(&mut img) {
        Ok(q) => q,
        Err(imagequant::Error::QualityTooLow) => return Ok(None),
        Err(e) => return Err(anyhow!("quantizing PNG: {e}")),
    };
    quantized
        .set_dithering_level(1.0)
        .map_err(|e| anyhow!("{e}"))?;
    let (palette, indexes) = quantized
        .remapped(&mut img)
        .map_err(|e| anyhow!("remapping PNG: {e}"))?;

    let mut rgb = Vec::with_capacity(palette.len() * 3);
    let mut alpha = Vec::with_capacity(palette.len());
    for color in &palette {
        rgb.extend_from_slice(&[color.r, color.g, color.b]);
        alpha.push(color.a);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(Cursor::new(&mut out), width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(rgb);
        if alpha.iter().any(|a| *a != 255) {
            encoder.set_trns(alpha);
        }
        let mut writer = encoder.write_header().context("writing PNG header")?;
        writer
            .write_image_data(&indexes)
            .context("writing PNG data")?;
        writer.finish().context("finishing PNG")?;
    }
    Ok(Some(out))
}

fn compress_one(bytes: Vec<u8>, ext: &str, ctx: &TaskContext) -> Result<Vec<u8>> {
    let cfg = &ctx.config.images;
    match ext {
        "jpg" | "jpeg" => recompress_jpeg(&bytes, cfg.jpeg_quality),
        "png" => Ok(quantize_png(&bytes, cfg.png_quality)?.unwrap_or(bytes)),
        "svg" => {
            let text = String::from_utf8(bytes).context("SVG is not UTF-8")?;
            Ok(svg::clean(&text).into_bytes())
        }
        _ => Ok(bytes),
    }
}

/// Compress every image changed since the last successful run into
/// `images.dist`. GIFs and unknown types are copied.
pub fn compress_images(ctx: &TaskContext, since: Option<SystemTime>) -> Result<TaskReport> {
    let cfg = &ctx.config.images;
    let dist = ctx.path(&cfg.dist);
    let (files, skipped) = modified_since(ctx, ctx.sources(&cfg.src)?, since);

    let mut report = TaskReport {
        skipped,
        ..TaskReport::default()
    };
    let mut failures = FileFailures::new(TaskKind::CompressImages);

    for file in files {
        let ext = extension(&file.rel);
        let result = ctx
            .fs
            .read(&file.path)
            .and_then(|bytes| compress_one(bytes, &ext, ctx));
        let bytes = match result {
            Ok(b) => b,
            Err(err) => {
                failures.record(&file.path, err);
                continue;
            }
        };

        let out = dist.join(&file.rel);
        ctx.fs.write(&out, &bytes)?;
        debug!(file = ?file.rel, bytes = bytes.len(), "image written");
        report.written += 1;
    }

    info!(
        task = %TaskKind::CompressImages,
        images = report.written,
        unchanged = report.skipped,
        "images compressed"
    );
    failures.finish(report)
}
