//! Error types for nha-core

use std::fmt::Write;
use thiserror::Error;

/// Remediation command for resolving an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to resolve or diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    /// Create a new remediation with a summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Add a suggested command
    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Add an alternative suggestion
    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nha-core
#[derive(Error, Debug)]
pub enum Error {
    /// tmux transport errors
    #[error("tmux error: {0}")]
    Bridge(#[from] BridgeError),

    /// Malformed argument passed to a bridge or engine call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Pattern compilation errors
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Persistence file errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::Bridge(err) => Some(err.remediation()),
            Self::Pattern(err) => Some(err.remediation()),
            Self::Config(err) => Some(err.remediation()),
            Self::Persistence(err) => Some(err.remediation()),
            Self::InvalidInput(_) => None,
            Self::Io(_) => Some(
                Remediation::new("Check filesystem permissions and paths, then retry.")
                    .alternative("Verify the persistence and log file directories exist."),
            ),
            Self::Json(_) => Some(
                Remediation::new("Validate the JSON input and retry.")
                    .alternative("Delete the persistence file to start from defaults."),
            ),
        }
    }

    /// Whether the error means the remote pane can no longer be driven.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Bridge(_))
    }
}

/// tmux bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    /// tmux binary not found in PATH
    #[error("tmux not found in PATH. Install tmux or add it to PATH.")]
    CliNotFound,

    /// No tmux server is running
    #[error("tmux server is not running. Start a tmux session first.")]
    ServerNotRunning,

    /// Specified pane does not exist
    #[error("Pane not found: {0}")]
    PaneNotFound(String),

    /// Command execution failed with stderr output
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Timeout waiting for command
    #[error("Command timed out after {0} seconds")]
    Timeout(u64),
}

impl BridgeError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::CliNotFound => {
                Remediation::new("Install tmux and ensure the `tmux` binary is on PATH.")
                    .command("Verify install", "tmux -V")
                    .alternative("Set bridge.tmux_binary in nha.toml to an absolute path.")
            }
            Self::ServerNotRunning => Remediation::new("Start tmux and run the game inside it.")
                .command("Start session", "tmux new -s nethack nethack")
                .command("List sessions", "tmux ls"),
            Self::PaneNotFound(pane) => {
                Remediation::new(format!("Pane {pane} does not exist. Use a valid target."))
                    .command("List panes", "tmux list-panes -a")
                    .alternative("Targets look like session:window.pane, e.g. nethack:0.0")
            }
            Self::CommandFailed(_) => {
                Remediation::new("tmux command failed. Check that the session is alive.")
                    .command("List panes", "tmux list-panes -a")
            }
            Self::Timeout(timeout) => Remediation::new(format!(
                "tmux did not answer within {timeout} seconds. Try again when the system is idle."
            ))
            .alternative("Raise bridge.command_timeout_secs in nha.toml."),
        }
    }
}

/// Pattern-specific errors
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),
}

impl PatternError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::InvalidRegex(_) => Remediation::new("A screen pattern failed to compile.")
                .alternative("This is a bug; please report it with the log file attached."),
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file {0}: {1}")]
    ReadFailed(String, String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::FileNotFound(path) => Remediation::new(format!(
                "Config file not found: {path}. Verify the path and retry."
            ))
            .command("Check path", format!("ls -l \"{path}\""))
            .alternative("Pass --config with the correct path."),
            Self::ReadFailed(path, _) => Remediation::new(format!(
                "Failed to read config file: {path}. Check permissions."
            ))
            .command("Check permissions", format!("ls -l \"{path}\"")),
            Self::InvalidValue(_) => {
                Remediation::new("An option has an unsupported value. Pick one of the listed values.")
            }
            Self::ParseFailed(_) => {
                Remediation::new("Config parse failed. Fix the syntax and retry.")
                    .alternative("Validate the file as TOML.")
            }
            Self::SerializeFailed(_) => {
                Remediation::new("Failed to serialize configuration. Check config values.")
            }
            Self::ValidationError(_) => {
                Remediation::new("Config validation failed. Fix the invalid options and retry.")
                    .command("Show usage", "nha watch --help")
            }
        }
    }
}

/// Persistence file errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Write failed but may succeed on a later tick
    #[error("Transient write failure for {path}: {reason}")]
    Transient { path: String, reason: String },

    /// Write failed for good; persistence is disabled for the run
    #[error("Cannot write {path}: {reason}")]
    Unwritable { path: String, reason: String },

    /// Snapshot could not be encoded
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
}

impl PersistenceError {
    /// Whether retrying on a later tick makes sense.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::Transient { .. } => {
                Remediation::new("Persistence write will be retried on the next tick.")
            }
            Self::Unwritable { path, .. } => {
                Remediation::new(format!("Make {path} writable or choose another path."))
                    .command("Check permissions", format!("ls -l \"{path}\""))
                    .alternative("Pass --persistence with a writable location.")
            }
            Self::Encode(_) => Remediation::new("Snapshot encoding failed; this is a bug."),
        }
    }
}

/// Format an error with remediation guidance for display.
#[must_use]
pub fn format_error_with_remediation(error: &Error) -> String {
    let mut output = format!("Error: {error}");
    if let Some(remediation) = error.remediation() {
        output.push('\n');
        output.push('\n');
        output.push_str(&remediation.render_plain());
    }
    output
}
