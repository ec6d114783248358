// src/logger.rs
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

/// Install the global subscriber:
///
/// - stdout and a daily rolling text log under `root/log_file`, both
///   filtered by `log_level` (an `EnvFilter` directive such as `"info"`),
/// - a daily rolling newline-delimited JSON file under `root/event_file`
///   that only receives `target: "request"` events, one per dispatched
///   interaction.
pub fn init_tracing(root: &Path, log_file: &str, event_file: &str, log_level: &str) -> Result<()> {
    // per layer, so the request report is written whatever the log level
    let level_filter = || {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level directive `{log_level}`"))
    };

    let txt_layer = fmt::layer()
        .with_writer(daily_appender(&root.join(log_file))?)
        .with_ansi(false)
        .with_filter(level_filter()?);

    let json_layer = fmt::layer()
        .json()
        .with_writer(daily_appender(&root.join(event_file))?)
        .with_target(true)
        .with_filter(EnvFilter::new("request=info"));

    let stdout_layer = fmt::layer()
        .with_thread_names(true)
        .with_filter(level_filter()?);

    Registry::default()
        .with(stdout_layer)
        .with(txt_layer)
        .with(json_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;
    Ok(())
}

/// Rolling appender writing `path` with a date suffix, creating the
/// directory when needed.
pub fn daily_appender(path: &Path) -> Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("log path {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .build(dir)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appender_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/logs/mailroom.log");

        daily_appender(&path).unwrap();

        assert!(dir.path().join("nested/logs").is_dir());
    }

    #[test]
    fn appender_rejects_path_without_file_name() {
        assert!(daily_appender(Path::new("/")).is_err());
    }
}
