// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build, watch and serve static site assets.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// When omitted, `Sitepipe.toml` in the current directory is used if it
    /// exists, otherwise the built-in defaults.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Load config, print the plan for the command, but run nothing.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The command to run; `default` when none was given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Dev)
    }
}

/// Entry points of the pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Build everything once, then watch sources and serve the site.
    #[command(name = "default", alias = "dev")]
    Dev,
    /// Build everything once and exit.
    Build,
    /// Delete the whole output directory.
    #[command(name = "cleanAll", alias = "clean-all")]
    CleanAll,
    /// Delete output contents except the asset directories.
    #[command(name = "cleanExcludeHtml", alias = "clean-exclude-html")]
    CleanExcludeHtml,
    /// Delete compiled style and script directories.
    #[command(name = "cleanCssJs", alias = "clean-css-js")]
    CleanCssJs,
    /// Delete the generated image directory.
    #[command(name = "cleanImages", alias = "clean-images")]
    CleanImages,
}

impl Command {
    /// Name of the plan this command runs.
    pub fn plan_name(self) -> &'static str {
        match self {
            Command::Dev => crate::dag::plans::DEFAULT_PLAN,
            Command::Build => crate::dag::plans::BUILD_PLAN,
            Command::CleanAll => crate::dag::plans::CLEAN_ALL_PLAN,
            Command::CleanExcludeHtml => crate::dag::plans::CLEAN_EXCLUDE_HTML_PLAN,
            Command::CleanCssJs => crate::dag::plans::CLEAN_CSS_JS_PLAN,
            Command::CleanImages => crate::dag::plans::CLEAN_IMAGES_PLAN,
        }
    }

    /// Only the default command keeps running after its plan finished.
    pub fn exits_when_idle(self) -> bool {
        !matches!(self, Command::Dev)
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_default_plan() {
        let args = CliArgs::try_parse_from(["sitepipe"]).unwrap();
        assert_eq!(args.command(), Command::Dev);
        assert_eq!(args.command().plan_name(), "default");
    }

    #[test]
    fn camel_case_and_kebab_names_both_parse() {
        let camel = CliArgs::try_parse_from(["sitepipe", "cleanCssJs"]).unwrap();
        let kebab = CliArgs::try_parse_from(["sitepipe", "clean-css-js"]).unwrap();
        assert_eq!(camel.command(), Command::CleanCssJs);
        assert_eq!(kebab.command(), Command::CleanCssJs);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args =
            CliArgs::try_parse_from(["sitepipe", "build", "--dry-run", "--config", "x.toml"])
                .unwrap();
        assert!(args.dry_run);
        assert_eq!(args.config.as_deref(), Some("x.toml"));
        assert!(args.command().exits_when_idle());
    }
}
