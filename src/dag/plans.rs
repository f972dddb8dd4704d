// src/dag/plans.rs

//! The named plans sitepipe can run.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dag::graph::StepGraph;
use crate::dag::plan::{parallel, series, task, Plan};
use crate::errors::{Result, SitepipeError};
use crate::types::TaskKind::*;

pub const DEFAULT_PLAN: &str = "default";
pub const BUILD_PLAN: &str = "build";
pub const CLEAN_ALL_PLAN: &str = "cleanAll";
pub const CLEAN_EXCLUDE_HTML_PLAN: &str = "cleanExcludeHtml";
pub const CLEAN_CSS_JS_PLAN: &str = "cleanCssJs";
pub const CLEAN_IMAGES_PLAN: &str = "cleanImages";

pub const WATCH_TEMPLATES_PLAN: &str = "watch:templates";
pub const WATCH_STYLES_PLAN: &str = "watch:styles";
pub const WATCH_VENDOR_STYLES_PLAN: &str = "watch:vendor-styles";
pub const WATCH_SCRIPTS_PLAN: &str = "watch:scripts";
pub const WATCH_VENDOR_SCRIPTS_PLAN: &str = "watch:vendor-scripts";
pub const WATCH_IMAGES_PLAN: &str = "watch:images";

/// Every asset build, concurrently.
pub fn build_plan() -> Plan {
    parallel([
        task(RenderTemplates),
        task(CompileStyles),
        task(CopyVendorStyles),
        task(CompileScripts),
        task(CopyVendorScripts),
        task(CompressImages),
        task(ConvertWebp),
    ])
}

/// Build once, then watch and serve.
pub fn default_plan() -> Plan {
    series([build_plan(), parallel([task(WatchFiles), task(ServeSite)])])
}

/// All plan definitions by name.
pub fn definitions() -> Vec<(&'static str, Plan)> {
    vec![
        (DEFAULT_PLAN, default_plan()),
        (BUILD_PLAN, build_plan()),
        (CLEAN_ALL_PLAN, task(CleanAll)),
        (CLEAN_EXCLUDE_HTML_PLAN, task(CleanExcludeHtml)),
        (CLEAN_CSS_JS_PLAN, task(CleanCssJs)),
        (CLEAN_IMAGES_PLAN, task(CleanImages)),
        (
            WATCH_TEMPLATES_PLAN,
            series([task(RenderTemplates), task(ReloadBrowser)]),
        ),
        // Stylesheets are injected by the client; no full reload.
        (WATCH_STYLES_PLAN, series([task(CompileStyles)])),
        (
            WATCH_VENDOR_STYLES_PLAN,
            series([task(CopyVendorStyles), task(ReloadBrowser)]),
        ),
        (
            WATCH_SCRIPTS_PLAN,
            series([task(CompileScripts), task(ReloadBrowser)]),
        ),
        (
            WATCH_VENDOR_SCRIPTS_PLAN,
            series([task(CopyVendorScripts), task(ReloadBrowser)]),
        ),
        (
            WATCH_IMAGES_PLAN,
            series([task(CompressImages), task(ConvertWebp), task(ReloadBrowser)]),
        ),
    ]
}

/// Compiled plans, shared between runs.
#[derive(Debug, Clone, Default)]
pub struct PlanBook {
    plans: BTreeMap<String, Arc<StepGraph>>,
}

impl PlanBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in plan set.
    pub fn standard() -> Self {
        let mut book = Self::new();
        for (name, plan) in definitions() {
            book.insert(name, &plan);
        }
        book
    }

    pub fn insert(&mut self, name: impl Into<String>, plan: &Plan) {
        self.plans.insert(name.into(), Arc::new(plan.compile()));
    }

    pub fn get(&self, name: &str) -> Result<Arc<StepGraph>> {
        self.plans
            .get(name)
            .cloned()
            .ok_or_else(|| SitepipeError::PlanNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plans.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_never_cleans() {
        let tasks = build_plan().tasks();
        assert!(tasks.iter().all(|k| !matches!(
            k,
            CleanAll | CleanExcludeHtml | CleanCssJs | CleanImages
        )));
        assert!(!tasks.contains(&WatchFiles));
    }

    #[test]
    fn default_serves_after_the_build() {
        let book = PlanBook::standard();
        let graph = book.get(DEFAULT_PLAN).unwrap();
        let stages = graph.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].len(), 7);
        let mut second: Vec<_> = stages[1].iter().map(|s| graph.kind(*s)).collect();
        second.sort();
        assert_eq!(second, vec![WatchFiles, ServeSite]);
    }

    #[test]
    fn unknown_plan_is_an_error() {
        let book = PlanBook::standard();
        assert!(matches!(
            book.get("deploy"),
            Err(SitepipeError::PlanNotFound(name)) if name == "deploy"
        ));
    }
}
