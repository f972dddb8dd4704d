// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `Sitepipe.toml`.
///
/// Every section and every key is optional; the defaults describe the usual
/// `src/` → `public/` layout:
///
/// ```toml
/// [templates]
/// src = ["src/templates/**/*.tera", "!src/templates/**/_*.tera"]
/// dist = "public"
///
/// [styles]
/// src = ["src/scss/**/*.scss"]
/// dist = "public/assets/css"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub templates: TemplatesSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub clean: CleanSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub templates: TemplatesSection,
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub images: ImagesSection,
    pub clean: CleanSection,
    pub server: ServerSection,
    pub watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            templates: raw.templates,
            styles: raw.styles,
            scripts: raw.scripts,
            images: raw.images,
            clean: raw.clean,
            server: raw.server,
            watch: raw.watch,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `[templates]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesSection {
    /// Templates rendered to pages. `!` entries exclude (partials).
    pub src: Vec<String>,
    /// Everything loaded into the template library, partials included.
    /// Also the watch patterns for the templates registration.
    pub watch: Vec<String>,
    pub dist: PathBuf,
    /// JSON document supplying the render context.
    pub data: PathBuf,
    /// Extension given to rendered files.
    pub extension: String,
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            src: strings(&["src/templates/**/*.tera", "!src/templates/**/_*.tera"]),
            watch: strings(&["src/templates/**/*.tera"]),
            dist: PathBuf::from("public"),
            data: PathBuf::from("template-data.json"),
            extension: "html".to_string(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesSection {
    pub src: Vec<String>,
    /// Vendor stylesheets copied verbatim.
    pub copy: Vec<String>,
    pub dist: PathBuf,
    pub dist_copy: PathBuf,
    /// Directory (relative to `dist`) receiving `.map` files.
    pub source_maps: PathBuf,
    /// Browser targets driving vendor prefixing, as `"major[.minor]"`.
    pub browsers: BTreeMap<String, String>,
}

impl Default for StylesSection {
    fn default() -> Self {
        let browsers = [
            ("chrome", "80"),
            ("edge", "80"),
            ("firefox", "78"),
            ("safari", "13"),
            ("ios_saf", "13"),
            ("samsung", "12"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            src: strings(&["src/scss/**/*.scss"]),
            copy: strings(&["src/css/vendors/*.css"]),
            dist: PathBuf::from("public/assets/css"),
            dist_copy: PathBuf::from("public/assets/css/vendors"),
            source_maps: PathBuf::from("map"),
            browsers,
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptsSection {
    pub src: Vec<String>,
    /// Vendor scripts copied verbatim.
    pub copy: Vec<String>,
    pub dist: PathBuf,
    /// ECMAScript level scripts are lowered to (e.g. `"es2015"`).
    pub target: String,
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            src: strings(&["src/js/**/*.js", "!src/js/**/vendors/*.js"]),
            copy: strings(&["src/js/**/vendors/*.js"]),
            dist: PathBuf::from("public/assets/js"),
            target: "es2015".to_string(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesSection {
    pub src: Vec<String>,
    /// Photographic sources converted to WebP.
    pub src_webp: Vec<String>,
    pub dist: PathBuf,
    pub dist_webp: PathBuf,
    pub jpeg_quality: u8,
    /// `[min, target]` quality range for palette PNGs.
    pub png_quality: [u8; 2],
    pub webp_quality: f32,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            src: strings(&["src/images/**/*.{jpg,jpeg,png,gif,svg}"]),
            src_webp: strings(&["src/images/**/*.{jpg,jpeg,png}"]),
            dist: PathBuf::from("public/assets/images"),
            dist_webp: PathBuf::from("public/assets/images/webp"),
            jpeg_quality: 80,
            png_quality: [60, 80],
            webp_quality: 75.0,
        }
    }
}

/// `[clean]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanSection {
    /// Output root removed by `cleanAll`.
    pub all: PathBuf,
    /// Entry names under `all` that `cleanExcludeHtml` leaves alone.
    pub keep: Vec<String>,
    /// Compiled style/script directories removed by `cleanCssJs`.
    pub assets: Vec<PathBuf>,
    /// Generated image directory removed by `cleanImages`.
    pub images: PathBuf,
}

impl Default for CleanSection {
    fn default() -> Self {
        Self {
            all: PathBuf::from("public"),
            keep: strings(&["assets"]),
            assets: vec![
                PathBuf::from("public/assets/css"),
                PathBuf::from("public/assets/js"),
            ],
            images: PathBuf::from("public/assets/images"),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Directory served at `/`, relative to the project root.
    pub base_dir: PathBuf,
    /// Path opened first, relative to `base_dir`.
    pub start_path: String,
    /// Full reloads closer together than this are coalesced.
    pub reload_debounce_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_dir: PathBuf::from("."),
            start_path: "public/index.html".to_string(),
            reload_debounce_ms: 500,
        }
    }
}

impl ServerSection {
    pub fn reload_debounce(&self) -> Duration {
        Duration::from_millis(self.reload_debounce_ms)
    }

    /// URL of the start page, e.g. `http://127.0.0.1:3000/public/index.html`.
    pub fn start_url(&self) -> String {
        format!(
            "http://{}:{}/{}",
            self.host,
            self.port,
            self.start_path.trim_start_matches("./").trim_start_matches('/')
        )
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSection {
    /// Quiet period used to batch filesystem events.
    pub debounce_ms: u64,
    /// Maximum pending re-runs per plan while it is running.
    pub queue_length: usize,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            queue_length: 1,
        }
    }
}

impl WatchSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Strip a leading `./` so paths and patterns compare the same way.
pub fn normalize_rel(path: &Path) -> PathBuf {
    path.strip_prefix(".").map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}
