// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{normalize_rel, ConfigFile, RawConfigFile};
use crate::errors::{Result, SitepipeError};
use crate::sources::SourceSet;
use crate::tasks::{scripts, styles};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_patterns(cfg)?;
    validate_paths(cfg)?;
    validate_qualities(cfg)?;
    validate_targets(cfg)?;
    validate_clean_targets(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    let lists: [(&str, &Vec<String>); 8] = [
        ("templates.src", &cfg.templates.src),
        ("templates.watch", &cfg.templates.watch),
        ("styles.src", &cfg.styles.src),
        ("styles.copy", &cfg.styles.copy),
        ("scripts.src", &cfg.scripts.src),
        ("scripts.copy", &cfg.scripts.copy),
        ("images.src", &cfg.images.src),
        ("images.src_webp", &cfg.images.src_webp),
    ];

    for (key, patterns) in lists {
        SourceSet::new(patterns).map_err(|err| match err {
            SitepipeError::ConfigError(msg) => {
                SitepipeError::ConfigError(format!("[{key}]: {msg}"))
            }
            other => other,
        })?;
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let mut paths: Vec<(&str, &Path)> = vec![
        ("templates.dist", &cfg.templates.dist),
        ("templates.data", &cfg.templates.data),
        ("styles.dist", &cfg.styles.dist),
        ("styles.dist_copy", &cfg.styles.dist_copy),
        ("styles.source_maps", &cfg.styles.source_maps),
        ("scripts.dist", &cfg.scripts.dist),
        ("images.dist", &cfg.images.dist),
        ("images.dist_webp", &cfg.images.dist_webp),
        ("clean.all", &cfg.clean.all),
        ("clean.images", &cfg.clean.images),
        ("server.base_dir", &cfg.server.base_dir),
    ];
    for asset in cfg.clean.assets.iter() {
        paths.push(("clean.assets", asset));
    }

    for (key, path) in paths {
        ensure_inside_root(key, path)?;
        if key.starts_with("clean.") {
            ensure_below_root(key, path)?;
        }
    }

    for name in cfg.clean.keep.iter() {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(SitepipeError::ConfigError(format!(
                "[clean].keep entries must be plain names (got '{name}')"
            )));
        }
    }

    let ext = cfg.templates.extension.as_str();
    if ext.is_empty() || ext.contains('.') || ext.contains('/') {
        return Err(SitepipeError::ConfigError(format!(
            "[templates].extension must be a bare extension like \"html\" (got '{ext}')"
        )));
    }

    Ok(())
}

/// Output and cleanup paths are relative to the project root and may not
/// climb out of it.
fn ensure_inside_root(key: &str, path: &Path) -> Result<()> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(SitepipeError::ConfigError(format!(
            "[{key}] must be a path inside the project root (got {:?})",
            path
        )));
    }
    Ok(())
}

/// Cleanup targets are deleted recursively; `.` or an empty path would
/// remove the whole project.
fn ensure_below_root(key: &str, path: &Path) -> Result<()> {
    if !path.components().any(|c| matches!(c, Component::Normal(_))) {
        return Err(SitepipeError::ConfigError(format!(
            "[{key}] must name a directory below the project root (got {:?})",
            path
        )));
    }
    Ok(())
}

fn validate_qualities(cfg: &RawConfigFile) -> Result<()> {
    let images = &cfg.images;

    if !(1..=100).contains(&images.jpeg_quality) {
        return Err(SitepipeError::ConfigError(format!(
            "[images].jpeg_quality must be within 1..=100 (got {})",
            images.jpeg_quality
        )));
    }

    let [min, target] = images.png_quality;
    if min > target || target > 100 {
        return Err(SitepipeError::ConfigError(format!(
            "[images].png_quality must be [min, target] with min <= target <= 100 (got [{min}, {target}])"
        )));
    }

    if !(0.0..=100.0).contains(&images.webp_quality) {
        return Err(SitepipeError::ConfigError(format!(
            "[images].webp_quality must be within 0..=100 (got {})",
            images.webp_quality
        )));
    }

    Ok(())
}

fn validate_targets(cfg: &RawConfigFile) -> Result<()> {
    styles::browser_targets(&cfg.styles.browsers)
        .map_err(|msg| SitepipeError::ConfigError(format!("[styles.browsers]: {msg}")))?;
    scripts::check_target(&cfg.scripts.target)
        .map_err(|msg| SitepipeError::ConfigError(format!("[scripts].target: {msg}")))?;
    Ok(())
}

/// `cleanCssJs` and `cleanImages` must never remove each other's output.
fn validate_clean_targets(cfg: &RawConfigFile) -> Result<()> {
    let images = normalize_rel(&cfg.clean.images);

    for asset in cfg.clean.assets.iter() {
        let asset = normalize_rel(asset);
        if overlaps(&asset, &images) {
            return Err(SitepipeError::ConfigError(format!(
                "[clean].assets entry {:?} overlaps [clean].images {:?}",
                asset, images
            )));
        }
    }

    let image_outputs: [PathBuf; 2] = [
        normalize_rel(&cfg.images.dist),
        normalize_rel(&cfg.images.dist_webp),
    ];
    for asset in cfg.clean.assets.iter() {
        let asset = normalize_rel(asset);
        if let Some(out) = image_outputs.iter().find(|out| out.starts_with(&asset)) {
            return Err(SitepipeError::ConfigError(format!(
                "[clean].assets entry {:?} would remove image output {:?}",
                asset, out
            )));
        }
    }

    Ok(())
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.queue_length == 0 {
        return Err(SitepipeError::ConfigError(
            "[watch].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }

    #[test]
    fn parent_dir_in_output_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.styles.dist = PathBuf::from("../elsewhere/css");
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("styles.dist"));
    }

    #[test]
    fn cleanup_target_at_the_root_is_rejected() {
        assert!(ensure_below_root("clean.all", Path::new("public")).is_ok());
        for root in ["", ".", "./", "./."] {
            assert!(ensure_below_root("clean.all", Path::new(root)).is_err(), "{root:?}");
        }
    }

    #[test]
    fn empty_path_overlaps_everything() {
        assert!(overlaps(Path::new(""), Path::new("public/assets/images")));
        assert!(!overlaps(Path::new("public/assets/css"), Path::new("public/assets/images")));
    }
}
