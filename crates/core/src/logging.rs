//! Logging setup on top of `tracing`.
//!
//! # Environment Variables
//!
//! - `SABLEYE_LOG`: Filter directive (like `RUST_LOG`), e.g., `sableye_skills=debug`
//! - `SABLEYE_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `SABLEYE_LOG_DIR`: Directory for file logs (default `~/.sableye/logs`)
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "warn"
//! format = "pretty"
//! file = false
//! ```

use crate::Error;
use crate::config::LoggingSection;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Tool output longer than this is truncated in debug logs.
pub const LOG_PREVIEW_CHARS: usize = 200;

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter when neither `SABLEYE_LOG` nor `RUST_LOG` is set
    pub level: String,
    /// Preferred stderr format; `None` picks one based on the terminal
    pub format: Option<LogFormat>,
    /// Also write JSON logs to a daily rolling file
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: None, file: false }
    }
}

impl From<&LoggingSection> for LoggingConfig {
    fn from(section: &LoggingSection) -> Self {
        Self { level: section.level.clone(), format: LogFormat::parse_str(&section.format), file: section.file }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_file_logging(mut self, enabled: bool) -> Self {
        self.file = enabled;
        self
    }

    fn filter_directive(&self) -> String {
        env::var("SABLEYE_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| self.level.clone())
    }

    fn is_tty() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    /// `SABLEYE_LOG_FORMAT`, then the configured format, then TTY detection.
    fn detect_format(&self) -> LogFormat {
        if let Ok(fmt_str) = env::var("SABLEYE_LOG_FORMAT")
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        if let Some(format) = self.format {
            return format;
        }

        if Self::is_tty() { LogFormat::Pretty } else { LogFormat::Compact }
    }

    fn log_dir() -> Result<PathBuf, Error> {
        if let Ok(custom_dir) = env::var("SABLEYE_LOG_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }

        dirs::home_dir()
            .map(|home| home.join(".sableye").join("logs"))
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
    }
}

/// Install the global tracing subscriber.
///
/// When file logging is enabled the returned guard must be held until exit,
/// otherwise buffered file output is lost.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<Option<WorkerGuard>, Error> {
    let config = config.unwrap_or_default();
    let env_filter = EnvFilter::new(config.filter_directive());
    let format = config.detect_format();

    let (file_writer, guard) = if config.file {
        let log_dir = LoggingConfig::log_dir()?;
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "sableye.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    build_subscriber(env_filter, format, file_writer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}

/// Stderr output in `format`, plus JSON lines to `file_writer` when given.
///
/// Each arm builds its own file layer: a `fmt::Layer` is typed by the
/// subscriber stack beneath it.
fn build_subscriber(
    env_filter: EnvFilter, format: LogFormat, file_writer: Option<NonBlocking>,
) -> Box<dyn Subscriber + Send + Sync> {
    let registry = Registry::default().with(env_filter);

    match format {
        LogFormat::Pretty => Box::new(
            registry
                .with(fmt::layer().pretty().with_writer(io::stderr).with_ansi(true))
                .with(file_writer.map(|writer| fmt::layer().json().with_writer(writer))),
        ),
        LogFormat::Json => Box::new(
            registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .with(file_writer.map(|writer| fmt::layer().json().with_writer(writer))),
        ),
        LogFormat::Compact => Box::new(
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .with(file_writer.map(|writer| fmt::layer().json().with_writer(writer))),
        ),
    }
}

/// Shorten long text for log lines.
pub fn truncate_for_log(content: &str, max_chars: usize) -> String {
    let total = content.chars().count();
    if total <= max_chars {
        return content.to_string();
    }

    let mut truncated = content.chars().take(max_chars).collect::<String>();
    truncated.push_str(&format!("... ({} total chars)", total));
    truncated
}

/// Sanitize file paths for logging (replace the home directory with `~`).
pub fn sanitize_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }

    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::parse_str("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse_str("PRETTY"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse_str("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse_str("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse_str("invalid"), None);
    }

    #[test]
    fn test_log_format_as_str() {
        for format in LogFormat::VALUES {
            assert_eq!(LogFormat::parse_str(format.as_str()), Some(*format));
        }
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert!(config.format.is_none());
        assert!(!config.file);
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::new()
            .with_level("debug")
            .with_format(LogFormat::Json)
            .with_file_logging(true);

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, Some(LogFormat::Json));
        assert!(config.file);
    }

    #[test]
    fn test_logging_config_from_section() {
        let section = LoggingSection { level: "info".to_string(), format: "compact".to_string(), file: true };
        let config = LoggingConfig::from(&section);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, Some(LogFormat::Compact));
        assert!(config.file);

        let section = LoggingSection { format: "sparkly".to_string(), ..LoggingSection::default() };
        assert!(LoggingConfig::from(&section).format.is_none());
    }

    #[test]
    fn test_file_layer_for_every_format() {
        let dir = tempfile::TempDir::new().unwrap();

        for format in LogFormat::VALUES {
            let file_name = format!("{}.log", format.as_str());
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir.path(), &file_name));
            let subscriber = build_subscriber(EnvFilter::new("info"), *format, Some(writer));
            tracing::subscriber::with_default(subscriber, || tracing::info!("file logging works"));
            drop(guard);

            let written = std::fs::read_to_string(dir.path().join(&file_name)).unwrap();
            assert!(written.contains("file logging works"), "{}: {}", format.as_str(), written);
        }
    }

    #[test]
    fn test_subscriber_without_file() {
        let subscriber = build_subscriber(EnvFilter::new("warn"), LogFormat::Compact, None);
        tracing::subscriber::with_default(subscriber, || tracing::warn!("stderr only"));
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");

        let truncated = truncate_for_log("abcdefghijklmnopqrstuvwxyz", 10);
        assert!(truncated.starts_with("abcdefghij..."));
        assert!(truncated.contains("26 total chars"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let text = "é".repeat(20);
        let truncated = truncate_for_log(&text, 5);
        assert!(truncated.starts_with("ééééé..."));
    }

    #[test]
    fn test_sanitize_path() {
        if let Some(home) = dirs::home_dir() {
            let test_path = home.join("notes").join("day.md");
            assert_eq!(sanitize_path(&test_path), "~/notes/day.md");
        }

        let abs_path = PathBuf::from("/var/log/test.log");
        assert_eq!(sanitize_path(&abs_path), "/var/log/test.log");
    }
}
