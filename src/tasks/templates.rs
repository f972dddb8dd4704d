// src/tasks/templates.rs

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tera::Tera;
use tracing::{debug, info};

use crate::tasks::html::finish_page;
use crate::tasks::{FileFailures, TaskContext, TaskReport};
use crate::types::TaskKind;
use crate::watch::path_utils::slash_path;

/// Read the template data document. It must be a JSON object.
pub fn load_template_data(ctx: &TaskContext) -> Result<tera::Context> {
    let path = ctx.path(&ctx.config.templates.data);
    let raw = ctx
        .fs
        .read_to_string(&path)
        .with_context(|| format!("loading template data {:?}", path))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing template data {:?}", path))?;
    if !value.is_object() {
        bail!("template data {:?} must be a JSON object", path);
    }
    tera::Context::from_value(value).context("building template context")
}

/// Load every template (partials included) into one library, named by path
/// relative to the pattern base.
fn load_library(ctx: &TaskContext) -> Result<Tera> {
    let mut library = Vec::new();
    for file in ctx.sources(&ctx.config.templates.watch)? {
        let content = ctx.fs.read_to_string(&file.path)?;
        library.push((slash_path(&file.rel), content));
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![".tera", ".html"]);
    tera.add_raw_templates(library)
        .context("parsing template library")?;
    Ok(tera)
}

/// Render every page template and write the post-processed HTML.
///
/// Missing or malformed data and library parse errors fail the whole attempt
/// before anything is written. A page that fails to render is reported and
/// the remaining pages are still written.
pub fn render_templates(ctx: &TaskContext) -> Result<TaskReport> {
    let cfg = &ctx.config.templates;
    let data = load_template_data(ctx)?;
    let tera = load_library(ctx)?;
    let pages = ctx.sources(&cfg.src)?;

    let dist = ctx.path(&cfg.dist);
    let mut report = TaskReport::default();
    let mut failures = FileFailures::new(TaskKind::RenderTemplates);

    for page in pages {
        let name = slash_path(&page.rel);
        let rendered = match tera.render(&name, &data) {
            Ok(html) => html,
            Err(err) => {
                failures.record(&page.path, anyhow::Error::new(err).context(format!("rendering {name}")));
                continue;
            }
        };

        let out = dist.join(page.rel.with_extension(&cfg.extension));
        ctx.fs.write(&out, finish_page(&rendered).as_bytes())?;
        debug!(template = %name, out = ?out, "page written");
        report.written += 1;
    }

    info!(task = %TaskKind::RenderTemplates, pages = report.written, "templates rendered");
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

    fn ctx(fs: &MockFileSystem) -> TaskContext {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        TaskContext::new("/site", Arc::new(cfg), Arc::new(fs.clone()))
    }

    #[test]
    fn partials_are_included_but_never_rendered() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/template-data.json", r#"{"title": "Home"}"#);
        fs.add_file("/site/src/templates/_head.tera", "<title>{{ title }}</title>");
        fs.add_file(
            "/site/src/templates/index.tera",
            "<!DOCTYPE html>\n<html>\n<head>{% include \"_head.tera\" %}</head>\n</html>",
        );

        let report = render_templates(&ctx(&fs)).unwrap();
        assert_eq!(report.written, 1);
        assert!(!fs.exists(Path::new("/site/public/_head.html")));

        let page = fs.read_to_string(Path::new("/site/public/index.html")).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Home</title>"));
    }

    #[test]
    fn missing_data_writes_nothing() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/templates/index.tera", "<p>{{ title }}</p>");

        let err = render_templates(&ctx(&fs)).unwrap_err();
        assert!(format!("{err:#}").contains("template data"));
        assert!(!fs.exists(Path::new("/site/public/index.html")));
    }

    #[test]
    fn data_must_be_an_object() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/template-data.json", "[1, 2]");
        let err = load_template_data(&ctx(&fs)).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }
}
