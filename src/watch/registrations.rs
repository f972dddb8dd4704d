// src/watch/registrations.rs

use std::fmt;

use crate::config::ConfigFile;
use crate::dag::plans::*;
use crate::errors::Result;
use crate::sources::SourceSet;

/// A compiled pattern list and the plan it triggers.
#[derive(Clone)]
pub struct WatchRegistration {
    name: &'static str,
    plan: &'static str,
    sources: SourceSet,
}

impl fmt::Debug for WatchRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRegistration")
            .field("name", &self.name)
            .field("plan", &self.plan)
            .finish()
    }
}

impl WatchRegistration {
    pub fn new<S: AsRef<str>>(
        name: &'static str,
        plan: &'static str,
        patterns: &[S],
    ) -> Result<Self> {
        Ok(Self {
            name,
            plan,
            sources: SourceSet::new(patterns)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn plan(&self) -> &'static str {
        self.plan
    }

    /// `rel_path` is slash-separated and relative to the project root.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.sources.matches(rel_path)
    }
}

/// One registration per watched asset kind.
pub fn build_registrations(cfg: &ConfigFile) -> Result<Vec<WatchRegistration>> {
    Ok(vec![
        WatchRegistration::new("templates", WATCH_TEMPLATES_PLAN, &cfg.templates.watch)?,
        WatchRegistration::new("styles", WATCH_STYLES_PLAN, &cfg.styles.src)?,
        WatchRegistration::new("vendor-styles", WATCH_VENDOR_STYLES_PLAN, &cfg.styles.copy)?,
        WatchRegistration::new("scripts", WATCH_SCRIPTS_PLAN, &cfg.scripts.src)?,
        WatchRegistration::new("vendor-scripts", WATCH_VENDOR_SCRIPTS_PLAN, &cfg.scripts.copy)?,
        WatchRegistration::new("images", WATCH_IMAGES_PLAN, &cfg.images.src)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;
    use crate::dag::PlanBook;

    fn defaults() -> Vec<WatchRegistration> {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        build_registrations(&cfg).unwrap()
    }

    fn matching(regs: &[WatchRegistration], rel: &str) -> Vec<&'static str> {
        regs.iter().filter(|r| r.matches(rel)).map(|r| r.name()).collect()
    }

    #[test]
    fn every_registration_plan_exists() {
        let book = PlanBook::standard();
        for reg in defaults() {
            assert!(book.contains(reg.plan()), "missing plan {}", reg.plan());
        }
    }

    #[test]
    fn vendor_files_only_trigger_vendor_registrations() {
        let regs = defaults();
        assert_eq!(matching(&regs, "src/js/vendors/jquery.js"), vec!["vendor-scripts"]);
        assert_eq!(matching(&regs, "src/js/app/main.js"), vec!["scripts"]);
        assert_eq!(matching(&regs, "src/css/vendors/reset.css"), vec!["vendor-styles"]);
    }

    #[test]
    fn partials_trigger_their_parent_registration() {
        let regs = defaults();
        assert_eq!(matching(&regs, "src/templates/_head.tera"), vec!["templates"]);
        assert_eq!(matching(&regs, "src/scss/_vars.scss"), vec!["styles"]);
    }
}
