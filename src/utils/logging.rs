// src/utils/logging.rs
// ============================================================================
// LOGGING AND TRACING CONFIGURATION
// ============================================================================
// Structured logging through the `tracing` ecosystem. The library itself only
// emits events; binaries and embedding applications call `init_logging` once.
// ============================================================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    Initialization(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Daily-rotated JSON log files are written here when set
    pub log_dir: Option<PathBuf>,
    pub enable_stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            log_dir: None,
            enable_stdout: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl TryFrom<&str> for LogLevel {
    type Error = LoggingError;

    fn try_from(s: &str) -> Result<Self, <LogLevel as TryFrom<&str>>::Error> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
    Pretty,
}

/// Keeps the non-blocking file writer alive; hold it for the life of the program.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let mut layers = Vec::new();
    let mut file_guard = None;

    if config.enable_stdout {
        let console_layer = match config.format {
            LogFormat::Text => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .boxed(),
        };
        layers.push(console_layer);
    }

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;
        let file_appender = tracing_appender::rolling::daily(log_dir, "linkdrop.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        layers.push(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .boxed(),
        );
        file_guard = Some(guard);
    }

    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level: Level = config.level.into();
        EnvFilter::new(format!("linkdrop_client={},linkdrop={}", level, level))
    });
    layers.push(env_filter.boxed());

    let subscriber = Registry::default().with(layers);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LoggingError::Initialization(e.to_string()))?;

    tracing::debug!(level = ?config.level, format = ?config.format, "logging initialized");
    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// `LINKDROP_LOG` / `LINKDROP_LOG_FORMAT` / `LINKDROP_LOG_DIR` on top of the defaults
pub fn init_logging_from_env() -> Result<LoggingGuard, LoggingError> {
    init_logging(&logging_config_from_env(LoggingConfig::default()))
}

pub(crate) fn logging_config_from_env(mut config: LoggingConfig) -> LoggingConfig {
    if let Some(level) = std::env::var("LINKDROP_LOG")
        .ok()
        .and_then(|s| LogLevel::try_from(s.as_str()).ok())
    {
        config.level = level;
    }
    if let Ok(format) = std::env::var("LINKDROP_LOG_FORMAT") {
        config.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Text,
        };
    }
    if let Ok(dir) = std::env::var("LINKDROP_LOG_DIR") {
        config.log_dir = Some(PathBuf::from(dir));
    }
    config
}
