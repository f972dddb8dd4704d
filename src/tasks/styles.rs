// src/tasks/styles.rs

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::media::MediaRule;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use lightningcss::traits::ToCss;
use parcel_sourcemap::SourceMap;
use tracing::{debug, info};

use crate::tasks::{FileFailures, TaskContext, TaskReport};
use crate::types::TaskKind;
use crate::watch::path_utils::slash_path;

/// Parse `[styles.browsers]` into lightningcss targets.
///
/// Versions are `"major"` or `"major.minor"`.
pub fn browser_targets(map: &BTreeMap<String, String>) -> std::result::Result<Browsers, String> {
    let mut browsers = Browsers::default();
    for (name, version) in map {
        let v = parse_version(version)
            .ok_or_else(|| format!("invalid version '{version}' for '{name}'"))?;
        let slot = match name.as_str() {
            "android" => &mut browsers.android,
            "chrome" => &mut browsers.chrome,
            "edge" => &mut browsers.edge,
            "firefox" => &mut browsers.firefox,
            "ie" => return Err("IE targets are not supported".to_string()),
            "ios_saf" => &mut browsers.ios_saf,
            "opera" => &mut browsers.opera,
            "safari" => &mut browsers.safari,
            "samsung" => &mut browsers.samsung,
            other => return Err(format!("unknown browser '{other}'")),
        };
        *slot = Some(v);
    }
    Ok(browsers)
}

fn parse_version(s: &str) -> Option<u32> {
    let mut parts = s.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || major > 255 || minor > 255 {
        return None;
    }
    Some((major << 16) | (minor << 8))
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Move top-level `@media` rules after all other rules, merging rules that
/// share the same query. Groups keep first-seen order.
pub fn group_media_queries(sheet: &mut StyleSheet<'_, '_>) {
    let rules = std::mem::take(&mut sheet.rules.0);
    let mut plain = Vec::with_capacity(rules.len());
    let mut groups: Vec<(String, MediaRule<'_>)> = Vec::new();

    for rule in rules {
        let CssRule::Media(media) = rule else {
            plain.push(rule);
            continue;
        };
        let Ok(key) = media.query.to_css_string(PrinterOptions::default()) else {
            plain.push(CssRule::Media(media));
            continue;
        };
        match groups.iter().position(|(k, _)| *k == key) {
            Some(idx) => groups[idx].1.rules.0.extend(media.rules.0),
            None => groups.push((key, media)),
        }
    }

    plain.extend(groups.into_iter().map(|(_, media)| CssRule::Media(media)));
    sheet.rules.0 = plain;
}

/// Compiled stylesheet and its v3 source map.
#[derive(Debug, Clone)]
pub struct CompiledStyle {
    pub css: String,
    pub map: String,
}

/// Compile one SCSS source: grass, media grouping, prefixing and minification.
pub fn compile_one(
    scss: &str,
    file_name: &str,
    load_dir: &Path,
    browsers: Browsers,
) -> Result<CompiledStyle> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Compressed)
        .load_path(load_dir);
    let css = grass::from_string(scss.to_string(), &options)
        .map_err(|e| anyhow!("{e}"))
        .context("compiling SCSS")?;

    // grass emits no map of its own, so positions are recorded against its
    // CSS output and that output is what the map ships as the source.
    let compiled_name = slash_path(&Path::new(file_name).with_extension("css"));

    let targets = Targets::from(browsers);
    let mut sheet = StyleSheet::parse(
        &css,
        ParserOptions {
            filename: compiled_name.clone(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| anyhow!("{e}"))
    .context("parsing compiled CSS")?;

    group_media_queries(&mut sheet);

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))
        .context("minifying CSS")?;

    let mut source_map = SourceMap::new("/");
    source_map.add_source(&compiled_name);
    source_map
        .set_source_content(0, &css)
        .map_err(|e| anyhow!("{e:?}"))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            source_map: Some(&mut source_map),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))
        .context("printing CSS")?;

    let map = source_map
        .to_json(None)
        .map_err(|e| anyhow!("{e:?}"))
        .context("serializing source map")?;

    Ok(CompiledStyle {
        css: printed.code,
        map,
    })
}

/// Relative URL from a stylesheet at `<dist>/<css_rel>` to its map at
/// `<dist>/<maps>/<css_rel>.map`.
pub fn map_url(css_rel: &Path, maps: &Path) -> String {
    let depth = css_rel
        .parent()
        .map(|p| p.components().filter(|c| matches!(c, Component::Normal(_))).count())
        .unwrap_or(0);
    let mut url = "../".repeat(depth);
    url.push_str(&slash_path(&maps.join(css_rel)));
    url.push_str(".map");
    url
}

/// Compile every non-partial SCSS file.
///
/// A file that fails to compile is reported and does not stop the others.
/// Written stylesheets are pushed to connected browsers without a reload.
pub fn compile_styles(ctx: &TaskContext) -> Result<TaskReport> {
    let cfg = &ctx.config.styles;
    let browsers = browser_targets(&cfg.browsers).map_err(|e| anyhow!(e))?;
    let dist = ctx.path(&cfg.dist);

    let mut report = TaskReport::default();
    let mut failures = FileFailures::new(TaskKind::CompileStyles);
    let mut written_urls = Vec::new();

    for file in ctx.sources(&cfg.src)? {
        if is_partial(&file.rel) {
            report.skipped += 1;
            continue;
        }

        let css_rel: PathBuf = file.rel.with_extension("css");
        let result = ctx.fs.read_to_string(&file.path).and_then(|scss| {
            let load_dir = file.path.parent().unwrap_or(&ctx.root);
            compile_one(&scss, &slash_path(&file.rel), load_dir, browsers)
        });

        let compiled = match result {
            Ok(c) => c,
            Err(err) => {
                failures.record(&file.path, err);
                continue;
            }
        };

        let css_out = dist.join(&css_rel);
        let map_out = dist.join(&cfg.source_maps).join(format!("{}.map", slash_path(&css_rel)));
        let css = format!(
            "{}\n/*# sourceMappingURL={} */\n",
            compiled.css,
            map_url(&css_rel, &cfg.source_maps)
        );

        ctx.fs.write(&css_out, css.as_bytes())?;
        ctx.fs.write(&map_out, compiled.map.as_bytes())?;
        debug!(file = ?file.rel, out = ?css_out, "stylesheet written");

        if let Some(url) = ctx.url_for(&css_out) {
            written_urls.push(url);
        }
        report.written += 1;
    }

    info!(
        task = %TaskKind::CompileStyles,
        stylesheets = report.written,
        partials = report.skipped,
        "styles compiled"
    );
    if !written_urls.is_empty() {
        ctx.reload.inject_css(written_urls);
    }
    failures.finish(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome_safari() -> Browsers {
        let mut map = BTreeMap::new();
        map.insert("chrome".to_string(), "80".to_string());
        map.insert("safari".to_string(), "13".to_string());
        browser_targets(&map).unwrap()
    }

    #[test]
    fn versions_are_packed_for_lightningcss() {
        assert_eq!(parse_version("13"), Some(13 << 16));
        assert_eq!(parse_version("13.1"), Some((13 << 16) | (1 << 8)));
        assert_eq!(parse_version("beta"), None);
    }

    #[test]
    fn unknown_and_ie_targets_are_rejected() {
        let mut map = BTreeMap::new();
        map.insert("ie".to_string(), "11".to_string());
        assert!(browser_targets(&map).is_err());

        let mut map = BTreeMap::new();
        map.insert("netscape".to_string(), "4".to_string());
        assert!(browser_targets(&map).unwrap_err().contains("netscape"));
    }

    #[test]
    fn identical_media_queries_are_merged_after_plain_rules() {
        let scss = "@media (min-width: 768px) { .a { color: red; } }\n\
                    .b { color: blue; }\n\
                    @media (min-width: 768px) { .c { color: green; } }";
        let out = compile_one(scss, "main.scss", Path::new("."), chrome_safari()).unwrap();

        assert_eq!(out.css.matches("@media").count(), 1);
        let media_at = out.css.find("@media").unwrap();
        assert!(out.css.find(".b").unwrap() < media_at);
        assert!(out.css[media_at..].contains(".a"));
        assert!(out.css[media_at..].contains(".c"));
    }

    #[test]
    fn source_map_points_at_the_css_it_was_built_from() {
        let scss = "$c: #333;\n.title { color: $c; }";
        let out = compile_one(scss, "pages/main.scss", Path::new("."), chrome_safari()).unwrap();
        let map: serde_json::Value = serde_json::from_str(&out.map).unwrap();
        assert_eq!(map["version"], 3);
        assert!(map["sources"][0].as_str().unwrap().ends_with("pages/main.css"));

        let content = map["sourcesContent"][0].as_str().unwrap();
        assert!(content.contains(".title") && content.contains("#333"));
        assert!(!content.contains("$c"));
    }

    #[test]
    fn map_url_climbs_out_of_nested_dirs() {
        assert_eq!(map_url(Path::new("main.css"), Path::new("map")), "map/main.css.map");
        assert_eq!(
            map_url(Path::new("pages/home.css"), Path::new("map")),
            "../map/pages/home.css.map"
        );
    }
}
