//! Structured logging for nha
//!
//! `tracing` events go to stderr in the pretty or JSON format, and
//! optionally to an append-mode log file as well.
//!
//! Field names used across the crate: `pane`, `item`, `price`, `turn`,
//! `charisma`, `xplevel`, `label`, `candidates`, `path`.

pub use crate::config::LogFormat;
use serde::{Deserialize, Serialize};
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::GeneralConfig;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level filter (trace, debug, info, warn, error), overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
    /// Append logs here in addition to stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl From<&GeneralConfig> for LogConfig {
    fn from(general: &GeneralConfig) -> Self {
        Self {
            level: general.log_level.clone(),
            format: general.log_format,
            file: general.log_file.as_ref().map(PathBuf::from),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("failed to open log file: {0}")]
    FileCreate(#[from] io::Error),

    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

fn open_log_file(path: &Path) -> io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let existed = path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    #[cfg(unix)]
    if !existed {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(SystemTime)
            .with_writer(io::stderr)
            .with_target(true)
            .flatten_event(true)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, file: std::fs::File) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(file)
            .with_target(false)
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(SystemTime)
            .with_writer(file)
            .with_target(true)
            .flatten_event(true)
            .boxed(),
    }
}

/// Install the global subscriber
///
/// Call once at startup; later calls fail with [`LogError::AlreadyInitialized`].
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let configured = EnvFilter::try_new(&config.level)
        .map_err(|_| LogError::InvalidLevel(config.level.clone()))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(configured);

    let mut layers = vec![stderr_layer(config.format)];
    if let Some(path) = &config.file {
        layers.push(file_layer(config.format, open_log_file(path)?));
    }

    tracing::subscriber::set_global_default(Registry::default().with(layers).with(env_filter))?;
    let _ = LOGGING_INITIALIZED.set(());

    tracing::debug!(
        log_level = %config.level,
        log_format = %config.format,
        log_file = ?config.file,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct CaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CaptureWriter {
        fn new() -> Self {
            Self {
                buffer: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn contents(&self) -> String {
            String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CaptureWriter {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn log_config_from_general() {
        let general = GeneralConfig {
            log_level: "debug".to_string(),
            log_format: LogFormat::Json,
            log_file: Some("/tmp/nha.log".to_string()),
        };
        let config = LogConfig::from(&general);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/nha.log")));
    }

    #[test]
    fn log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn json_logs_carry_fields() {
        let writer = CaptureWriter::new();
        let subscriber = tracing_subscriber::registry().with(EnvFilter::new("info")).with(
            fmt::layer()
                .json()
                .with_timer(SystemTime)
                .flatten_event(true)
                .with_writer(writer.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(item = "bubbly potion", price = 133u32, "Item for sale");
            tracing::debug!("filtered out");
        });

        let output = writer.contents();
        let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert!(parsed.get("timestamp").is_some());
        assert_eq!(
            parsed.get("item").and_then(|v| v.as_str()),
            Some("bubbly potion")
        );
        assert_eq!(
            parsed.get("price").and_then(serde_json::Value::as_u64),
            Some(133)
        );
    }

    #[test]
    fn log_file_is_created_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("nha.log");
        let file = open_log_file(&path).unwrap();
        drop(file);
        assert!(path.exists());
        #[cfg(unix)]
        {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
