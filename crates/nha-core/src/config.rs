//! Configuration management for nha
//!
//! Handles loading and validation of nha.toml configuration files.
//!
//! # Schema Overview
//!
//! The configuration is structured into sections:
//! - `general`: Log level, format and optional log file
//! - `bridge`: tmux binary, poll interval, command timeout, wait strategy
//! - `monitor`: Windowport, label budget, turn limit, auto-engrave, persistence
//! - `boxes`: Border glyphs used to detect bordered panels
//!
//! # Forward Compatibility
//!
//! All sections use `#[serde(default)]` to allow missing fields.
//! Unknown fields are ignored to support forward compatibility.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::boxes::BorderGlyphs;
use crate::error::ConfigError;
use crate::tmux::WaitStrategy;

const CONFIG_FILE_NAME: &str = "nha.toml";

/// Main configuration structure for nha
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub bridge: BridgeConfig,
    pub monitor: MonitorConfig,
    pub boxes: BorderGlyphs,
}

// =============================================================================
// General Config
// =============================================================================

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable pretty format (default for interactive use)
    #[default]
    Pretty,
    /// Machine-parseable JSON lines
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid log format: {other} (expected 'pretty' or 'json')"
            ))),
        }
    }
}

/// General configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,

    /// Log format: pretty (human-readable) or json (machine-parseable)
    pub log_format: LogFormat,

    /// Optional log file path (supports ~ expansion)
    /// When set, logs are appended to this file in addition to stderr
    pub log_file: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            log_file: None,
        }
    }
}

// =============================================================================
// Bridge Config
// =============================================================================

/// tmux bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// tmux executable name or path
    pub tmux_binary: String,

    /// Delay between screen polls and between ticks (milliseconds)
    pub poll_interval_ms: u64,

    /// Timeout for a single tmux command (seconds)
    pub command_timeout_secs: u64,

    /// How to wait for screen changes: poll or hook
    pub wait_strategy: WaitStrategy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tmux_binary: "tmux".to_string(),
            poll_interval_ms: 120,
            command_timeout_secs: crate::tmux::DEFAULT_TIMEOUT_SECS,
            wait_strategy: WaitStrategy::Poll,
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// Monitor Config
// =============================================================================

/// Game windowport rendering the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Windowport {
    #[default]
    Tty,
    /// Accepted in files but rejected by validation
    Curses,
}

impl std::fmt::Display for Windowport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tty => write!(f, "tty"),
            Self::Curses => write!(f, "curses"),
        }
    }
}

impl std::str::FromStr for Windowport {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tty" => Ok(Self::Tty),
            "curses" => Ok(Self::Curses),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid windowport: {other} (expected 'tty' or 'curses')"
            ))),
        }
    }
}

/// Monitor behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub windowport: Windowport,

    /// Character budget for call labels
    pub max_label_length: usize,

    /// Turns to play before the game is saved automatically
    pub turn_limit: Option<u32>,

    /// Stop on the next multiple of `turn_limit` instead of `turn + turn_limit`
    pub aligned_turn_limit: bool,

    /// Type the engrave word whenever the player starts a fingertip engraving
    pub auto_engrave: bool,

    pub engrave_word: String,

    /// How long status banners stay visible (seconds, 0 disables them)
    pub message_duration_secs: u64,

    /// Where learned facts are stored between sessions (supports ~ expansion)
    pub persistence_file: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            windowport: Windowport::Tty,
            max_label_length: 60,
            turn_limit: None,
            aligned_turn_limit: false,
            auto_engrave: false,
            engrave_word: "Elbereth".to_string(),
            message_duration_secs: 2,
            persistence_file: None,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn message_duration(&self) -> Duration {
        Duration::from_secs(self.message_duration_secs)
    }

    #[must_use]
    pub fn persistence_path(&self) -> Option<PathBuf> {
        self.persistence_file.as_deref().map(PathBuf::from)
    }
}

// =============================================================================
// Config Loading
// =============================================================================

/// CLI overrides applied on top of the config file
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub log_file: Option<String>,
    pub windowport: Option<Windowport>,
    pub max_label_length: Option<usize>,
    pub turn_limit: Option<u32>,
    pub aligned_turn_limit: Option<bool>,
    pub auto_engrave: Option<bool>,
    pub persistence_file: Option<String>,
    pub wait_strategy: Option<WaitStrategy>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(ref log_level) = self.log_level {
            config.general.log_level.clone_from(log_level);
        }
        if let Some(log_format) = self.log_format {
            config.general.log_format = log_format;
        }
        if let Some(ref log_file) = self.log_file {
            config.general.log_file = Some(log_file.clone());
        }
        if let Some(windowport) = self.windowport {
            config.monitor.windowport = windowport;
        }
        if let Some(length) = self.max_label_length {
            config.monitor.max_label_length = length;
        }
        if let Some(limit) = self.turn_limit {
            config.monitor.turn_limit = Some(limit);
        }
        if let Some(aligned) = self.aligned_turn_limit {
            config.monitor.aligned_turn_limit = aligned;
        }
        if let Some(auto_engrave) = self.auto_engrave {
            config.monitor.auto_engrave = auto_engrave;
        }
        if let Some(ref path) = self.persistence_file {
            config.monitor.persistence_file = Some(path.clone());
        }
        if let Some(strategy) = self.wait_strategy {
            config.bridge.wait_strategy = strategy;
        }
    }
}

/// Resolve the config path that would be loaded (if any).
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let cwd_config = Path::new(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config.to_path_buf());
    }

    dirs_config_path()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./nha.toml (current directory)
    /// 2. $XDG_CONFIG_HOME/nha/nha.toml or ~/.config/nha/nha.toml
    /// 3. Default values
    pub fn load() -> crate::Result<Self> {
        match resolve_config_path(None) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.display().to_string(), e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()).into())
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeFailed(e.to_string()).into())
    }

    /// Load configuration with overrides and validation
    ///
    /// Resolution order: defaults -> config file -> CLI overrides.
    /// An explicit path must exist.
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> crate::Result<Self> {
        let mut config = match config_path {
            Some(path) if path.exists() => Self::load_from(path)?,
            Some(path) => {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            None => Self::load()?,
        };

        overrides.apply(&mut config);
        config.normalize_paths();
        config.validate()?;

        Ok(config)
    }

    /// Replace a leading `~` in file paths with the home directory
    pub fn normalize_paths(&mut self) {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let paths = [
            &mut self.general.log_file,
            &mut self.monitor.persistence_file,
        ];
        for path in paths.into_iter().flatten() {
            let expanded = match path.as_str() {
                "~" => home.clone(),
                other => match other.strip_prefix("~/") {
                    Some(rest) => home.join(rest),
                    None => continue,
                },
            };
            *path = expanded.to_string_lossy().into_owned();
        }
    }

    /// Validate semantic constraints
    pub fn validate(&self) -> crate::Result<()> {
        let fail = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()).into());

        if self.monitor.windowport == Windowport::Curses {
            // TODO: support the curses windowport once its panel layout is mapped
            return fail("monitor.windowport = curses is not implemented; use tty");
        }
        if self.monitor.max_label_length == 0 {
            return fail("monitor.max_label_length must be >= 1");
        }
        if self.monitor.turn_limit == Some(0) {
            return fail("monitor.turn_limit must be >= 1");
        }
        if self.monitor.aligned_turn_limit && self.monitor.turn_limit.is_none() {
            return fail("monitor.aligned_turn_limit requires monitor.turn_limit");
        }
        if self.monitor.engrave_word.trim().is_empty() {
            return fail("monitor.engrave_word must not be empty");
        }
        if self.bridge.poll_interval_ms == 0 {
            return fail("bridge.poll_interval_ms must be >= 1");
        }
        if self.bridge.command_timeout_secs == 0 {
            return fail("bridge.command_timeout_secs must be >= 1");
        }
        if self.bridge.tmux_binary.trim().is_empty() {
            return fail("bridge.tmux_binary must not be empty");
        }

        Ok(())
    }
}

/// Per-user config directory (`$XDG_CONFIG_HOME/nha`, `~/Library/Application Support/nha`)
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nha"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn validation_message(config: &Config) -> String {
        match config.validate() {
            Err(Error::Config(ConfigError::ValidationError(msg))) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.bridge.poll_interval_ms, 120);
        assert_eq!(config.bridge.command_timeout_secs, 5);
        assert_eq!(config.monitor.max_label_length, 60);
        assert_eq!(config.monitor.engrave_word, "Elbereth");
        assert_eq!(config.monitor.message_duration(), Duration::from_secs(2));
        assert!(config.monitor.turn_limit.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn default_config_serializes_to_toml() {
        let toml = Config::default().to_toml().expect("Failed to serialize");
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[bridge]"));
        assert!(toml.contains("[monitor]"));
        assert!(toml.contains("[boxes]"));
    }

    #[test]
    fn default_config_roundtrips() {
        let config = Config::default();
        let toml = config.to_toml().expect("Failed to serialize");
        let parsed = Config::from_toml(&toml).expect("Failed to parse");

        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.bridge.wait_strategy, parsed.bridge.wait_strategy);
        assert_eq!(
            config.monitor.max_label_length,
            parsed.monitor.max_label_length
        );
        assert_eq!(config.boxes, parsed.boxes);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml("").expect("Failed to parse empty TOML");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.bridge.poll_interval_ms, 120);
    }

    #[test]
    fn partial_toml_uses_defaults_for_missing() {
        let toml = r#"
[bridge]
wait_strategy = "hook"

[monitor]
turn_limit = 500
aligned_turn_limit = true

[boxes]
vertical = "║"
"#;
        let config = Config::from_toml(toml).expect("Failed to parse");

        assert_eq!(config.bridge.wait_strategy, WaitStrategy::Hook);
        assert_eq!(config.monitor.turn_limit, Some(500));
        assert!(config.monitor.aligned_turn_limit);
        assert_eq!(config.boxes.vertical, '║');

        assert_eq!(config.boxes.horizontal, '─');
        assert_eq!(config.bridge.tmux_binary, "tmux");
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let toml = r#"
[general]
log_level = "debug"
shiny_new_option = true

[future_section]
value = 1
"#;
        let config = Config::from_toml(toml).expect("Failed to parse");
        assert_eq!(config.general.log_level, "debug");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::from_toml("[monitor\nturn_limit = ").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn aligned_without_limit_is_rejected() {
        let mut config = Config::default();
        config.monitor.aligned_turn_limit = true;
        assert!(validation_message(&config).contains("aligned_turn_limit"));
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut config = Config::default();
        config.monitor.turn_limit = Some(0);
        assert!(validation_message(&config).contains("turn_limit"));

        let mut config = Config::default();
        config.monitor.max_label_length = 0;
        assert!(validation_message(&config).contains("max_label_length"));

        let mut config = Config::default();
        config.bridge.poll_interval_ms = 0;
        assert!(validation_message(&config).contains("poll_interval_ms"));

        let mut config = Config::default();
        config.bridge.command_timeout_secs = 0;
        assert!(validation_message(&config).contains("command_timeout_secs"));
    }

    #[test]
    fn curses_windowport_is_rejected() {
        let mut config = Config::default();
        config.monitor.windowport = Windowport::Curses;
        assert!(validation_message(&config).contains("curses"));
    }

    #[test]
    fn overrides_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nha.toml");
        std::fs::write(&path, "[monitor]\nmax_label_length = 40\nauto_engrave = false\n").unwrap();

        let overrides = ConfigOverrides {
            log_level: Some("debug".to_string()),
            max_label_length: Some(30),
            turn_limit: Some(1000),
            aligned_turn_limit: Some(true),
            auto_engrave: Some(true),
            persistence_file: Some("/tmp/nha-state.json".to_string()),
            ..ConfigOverrides::default()
        };
        let config = Config::load_with_overrides(Some(&path), &overrides).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.monitor.max_label_length, 30);
        assert_eq!(config.monitor.turn_limit, Some(1000));
        assert!(config.monitor.aligned_turn_limit);
        assert!(config.monitor.auto_engrave);
        assert_eq!(
            config.monitor.persistence_path(),
            Some(PathBuf::from("/tmp/nha-state.json"))
        );
    }

    #[test]
    fn overrides_are_validated() {
        let overrides = ConfigOverrides {
            aligned_turn_limit: Some(true),
            ..ConfigOverrides::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nha.toml");
        std::fs::write(&path, "").unwrap();
        let err = Config::load_with_overrides(Some(&path), &overrides).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Config::load_with_overrides(Some(&path), &ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            "gtk".parse::<Windowport>(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn tilde_is_expanded() {
        let mut config = Config::default();
        config.monitor.persistence_file = Some("~/nha.json".to_string());
        config.general.log_file = Some("/var/log/nha.log".to_string());
        config.normalize_paths();

        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.monitor.persistence_path(), Some(home.join("nha.json")));
        }
        assert_eq!(config.general.log_file.as_deref(), Some("/var/log/nha.log"));
    }
}
