use std::fmt;
use std::str::FromStr;

/// Every unit of work the pipeline knows how to run.
///
/// Build and clean kinds are plain file transforms executed on the blocking
/// pool. `WatchFiles` and `ServeSite` start long-lived services and complete
/// as soon as the service is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    RenderTemplates,
    CompileStyles,
    CopyVendorStyles,
    CompileScripts,
    CopyVendorScripts,
    CompressImages,
    ConvertWebp,
    CleanAll,
    CleanExcludeHtml,
    CleanCssJs,
    CleanImages,
    ReloadBrowser,
    WatchFiles,
    ServeSite,
}

impl TaskKind {
    pub const ALL: [TaskKind; 14] = [
        TaskKind::RenderTemplates,
        TaskKind::CompileStyles,
        TaskKind::CopyVendorStyles,
        TaskKind::CompileScripts,
        TaskKind::CopyVendorScripts,
        TaskKind::CompressImages,
        TaskKind::ConvertWebp,
        TaskKind::CleanAll,
        TaskKind::CleanExcludeHtml,
        TaskKind::CleanCssJs,
        TaskKind::CleanImages,
        TaskKind::ReloadBrowser,
        TaskKind::WatchFiles,
        TaskKind::ServeSite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskKind::RenderTemplates => "render_templates",
            TaskKind::CompileStyles => "compile_styles",
            TaskKind::CopyVendorStyles => "copy_vendor_styles",
            TaskKind::CompileScripts => "compile_scripts",
            TaskKind::CopyVendorScripts => "copy_vendor_scripts",
            TaskKind::CompressImages => "compress_images",
            TaskKind::ConvertWebp => "convert_webp",
            TaskKind::CleanAll => "clean_all",
            TaskKind::CleanExcludeHtml => "clean_exclude_html",
            TaskKind::CleanCssJs => "clean_css_js",
            TaskKind::CleanImages => "clean_images",
            TaskKind::ReloadBrowser => "reload_browser",
            TaskKind::WatchFiles => "watch_files",
            TaskKind::ServeSite => "serve_site",
        }
    }

    /// Long-lived services are started by the executor itself instead of
    /// running a task body.
    pub fn is_service(self) -> bool {
        matches!(self, TaskKind::WatchFiles | TaskKind::ServeSite)
    }

    /// Tasks that skip sources not modified since their last successful run.
    pub fn is_since_gated(self) -> bool {
        matches!(self, TaskKind::CompressImages | TaskKind::ConvertWebp)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TaskKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| format!("unknown task: {wanted}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.name().parse::<TaskKind>(), Ok(kind));
        }
        assert!("compile_everything".parse::<TaskKind>().is_err());
    }

    #[test]
    fn only_watch_and_serve_are_services() {
        let services: Vec<_> = TaskKind::ALL.into_iter().filter(|k| k.is_service()).collect();
        assert_eq!(services, vec![TaskKind::WatchFiles, TaskKind::ServeSite]);
    }
}
