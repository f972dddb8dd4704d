// src/logging.rs

//! Logging setup for `sitepipe` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to sitepipe itself; dependencies stay at `warn`)
//! 2. `SITEPIPE_LOG`, read as `EnvFilter` directives, e.g.
//!    `sitepipe=debug,tower_http=debug`
//! 3. `info` for sitepipe
//!
//! Logs go to STDERR so dry-run output on stdout stays clean.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Name of the environment variable consulted when no CLI level is given.
pub const LOG_ENV_VAR: &str = "SITEPIPE_LOG";

/// Dependencies that log per request or per file event.
const QUIET_DEPS: &[&str] = &["tower_http", "notify", "globset", "tera"];

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directives_for(level));
    }
    env.and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(directives_for(LogLevel::Info)))
}

/// `level` for sitepipe, `warn` for the chatty dependencies.
fn directives_for(level: LogLevel) -> String {
    let mut out = vec![format!("sitepipe={}", level_name(level))];
    let deps = match level {
        LogLevel::Trace => "trace",
        _ => "warn",
    };
    out.extend(QUIET_DEPS.iter().map(|dep| format!("{dep}={deps}")));
    out.push("warn".to_string());
    out.join(",")
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_targets_sitepipe_and_quiets_dependencies() {
        let d = directives_for(LogLevel::Debug);
        assert!(d.starts_with("sitepipe=debug,"));
        assert!(d.contains("tower_http=warn"));
        assert!(d.ends_with(",warn"));
    }

    #[test]
    fn trace_opens_up_dependencies_too() {
        assert!(directives_for(LogLevel::Trace).contains("notify=trace"));
    }

    #[test]
    fn env_directives_are_used_when_valid() {
        let filter = build_filter(None, Some("sitepipe=trace"));
        assert_eq!(filter.to_string(), "sitepipe=trace");

        let fallback = build_filter(None, Some("sitepipe=loud"));
        assert!(fallback.to_string().contains("sitepipe=info"));
    }
}
