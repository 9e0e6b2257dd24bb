//! tmux frame bridge
//!
//! [`FrameBridge`] is the capability the monitor needs from a terminal:
//! capture the screen, block until it changes, search it, type into it and
//! show a banner. [`TmuxClient`] implements it by shelling out to the
//! `tmux` CLI:
//!
//! - `capture-pane -p` for frames
//! - `send-keys` (with `-l` for literal text) for keystrokes
//! - `display-message -d` for banners, scoped to the pane's session
//! - optionally `set-hook alert-activity` + `wait-for` to avoid busy polling
//!
//! Every command runs under a timeout and failures are categorized into
//! [`BridgeError`] variants so callers can give precise remediation.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::{sleep, timeout};

use crate::Result;
use crate::error::{BridgeError, Error};
use crate::frame::{self, Frame, FrameMatch, FrameMatches};

/// Default command timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Default delay between screen polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(120);
/// A hook wait gives up after this many poll intervals and re-captures
const HOOK_WAIT_FACTOR: u32 = 8;

/// A keystroke token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Literal characters, typed as-is
    Text(String),
    /// Return (`C-m`)
    Enter,
    Escape,
}

impl Key {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn tmux_name(&self) -> Option<&'static str> {
        match self {
            Self::Text(_) => None,
            Self::Enter => Some("Enter"),
            Self::Escape => Some("Escape"),
        }
    }
}

/// How [`TmuxClient::wait_for_change`] blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategy {
    /// Re-capture on a fixed interval
    #[default]
    Poll,
    /// Block on a tmux activity hook, falling back to polling on error
    Hook,
}

impl std::fmt::Display for WaitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poll => write!(f, "poll"),
            Self::Hook => write!(f, "hook"),
        }
    }
}

impl std::str::FromStr for WaitStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poll" => Ok(Self::Poll),
            "hook" => Ok(Self::Hook),
            _ => Err(format!("Invalid wait strategy: {s}. Use 'poll' or 'hook'")),
        }
    }
}

/// Synchronized access to one remote terminal pane
///
/// Implementations keep exactly one cached frame; `search` and
/// `search_all` always run against it.
#[allow(async_fn_in_trait)]
pub trait FrameBridge {
    /// Target pane identifier
    fn pane(&self) -> &str;

    /// Most recently captured frame
    fn current(&self) -> &Frame;

    /// Capture the screen and replace the cached frame
    async fn capture(&mut self) -> Result<Frame>;

    /// Block until the screen differs from the cached frame
    async fn wait_for_change(&mut self) -> Result<Frame>;

    /// Type keystrokes into the pane
    ///
    /// Fails with [`Error::InvalidInput`] when `keys` is empty.
    async fn send_keys(&mut self, keys: &[Key]) -> Result<()>;

    /// Show a banner; a zero duration does nothing
    async fn display_message(&mut self, text: &str, duration: Duration, modal: bool)
    -> Result<()>;

    fn search(&self, regex: &Regex, collapse_whitespace: bool) -> Option<FrameMatch> {
        frame::search(self.current(), regex, collapse_whitespace)
    }

    fn search_all(&self, regex: &Regex, collapse_whitespace: bool) -> FrameMatches {
        frame::search_all(self.current(), regex, collapse_whitespace)
    }

    async fn send_keys_and_wait(&mut self, keys: &[Key]) -> Result<Frame> {
        self.send_keys(keys).await?;
        self.wait_for_change().await
    }
}

/// tmux CLI client bound to a single pane
///
/// Errors:
/// - `CliNotFound`: tmux binary not in PATH
/// - `ServerNotRunning`: no tmux server to talk to
/// - `PaneNotFound`: the target pane doesn't exist
/// - `Timeout`: a command took too long
#[derive(Debug)]
pub struct TmuxClient {
    binary: String,
    pane: String,
    timeout_secs: u64,
    poll_interval: Duration,
    wait_strategy: WaitStrategy,
    hook_channel: Option<String>,
    cached: Frame,
}

impl TmuxClient {
    /// Create a client for `pane` (e.g. `nethack:0.0`); call [`connect`](Self::connect) next
    #[must_use]
    pub fn new(pane: impl Into<String>) -> Self {
        Self {
            binary: "tmux".to_string(),
            pane: pane.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_strategy: WaitStrategy::Poll,
            hook_channel: None,
            cached: Frame::default(),
        }
    }

    /// Use a different tmux executable
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the per-command timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_wait_strategy(mut self, strategy: WaitStrategy) -> Self {
        self.wait_strategy = strategy;
        self
    }

    /// Verify the pane is reachable, cache the first frame and install the
    /// activity hook when requested
    pub async fn connect(mut self) -> Result<Self> {
        self.capture().await?;
        if self.wait_strategy == WaitStrategy::Hook {
            if let Err(err) = self.install_hook().await {
                tracing::warn!(pane = %self.pane, error = %err, "Activity hook unavailable, polling instead");
                self.wait_strategy = WaitStrategy::Poll;
            }
        }
        tracing::info!(pane = %self.pane, strategy = %self.wait_strategy, "Connected to tmux pane");
        Ok(self)
    }

    /// Remove the activity hook, if one was installed
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.hook_channel.take().is_some() {
            let session = session_of(&self.pane).to_string();
            self.run(&["set-hook", "-u", "-t", &session, "alert-activity"])
                .await?;
        }
        Ok(())
    }

    #[must_use]
    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait_strategy
    }

    async fn capture_raw(&self) -> Result<Frame> {
        let text = self
            .run(&["capture-pane", "-t", &self.pane, "-p"])
            .await?;
        Ok(Frame::new(text))
    }

    async fn install_hook(&mut self) -> Result<()> {
        let channel = hook_channel_name(&self.pane);
        let session = session_of(&self.pane).to_string();
        self.run(&["set-option", "-w", "-t", &self.pane, "monitor-activity", "on"])
            .await?;
        let hook = format!("wait-for -S {channel}");
        self.run(&["set-hook", "-t", &session, "alert-activity", &hook])
            .await?;
        self.hook_channel = Some(channel);
        Ok(())
    }

    /// Block on the hook channel for at most a few poll intervals
    async fn wait_for_signal(&self, channel: &str) -> Result<()> {
        let bound = self.poll_interval * HOOK_WAIT_FACTOR;
        let mut cmd = Command::new(&self.binary);
        cmd.args(["wait-for", channel]).kill_on_drop(true);
        match timeout(bound, cmd.output()).await {
            // No activity within the bound; the caller re-captures anyway.
            Err(_) => Ok(()),
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(categorize_stderr(
                &String::from_utf8_lossy(&output.stderr),
                &self.pane,
            )
            .into()),
            Ok(Err(e)) => Err(categorize_io_error(&e).into()),
        }
    }

    /// Run a tmux command with timeout
    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).kill_on_drop(true);

        let output = match timeout(Duration::from_secs(self.timeout_secs), cmd.output()).await {
            Ok(result) => result.map_err(|e| categorize_io_error(&e))?,
            Err(_) => return Err(BridgeError::Timeout(self.timeout_secs).into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(pane = %self.pane, command = args.first().copied().unwrap_or(""), stderr = %stderr.trim(), "Tmux command failed");
            return Err(categorize_stderr(&stderr, &self.pane).into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl FrameBridge for TmuxClient {
    fn pane(&self) -> &str {
        &self.pane
    }

    fn current(&self) -> &Frame {
        &self.cached
    }

    async fn capture(&mut self) -> Result<Frame> {
        let frame = self.capture_raw().await?;
        self.cached = frame.clone();
        Ok(frame)
    }

    async fn wait_for_change(&mut self) -> Result<Frame> {
        loop {
            let frame = self.capture_raw().await?;
            if frame != self.cached {
                self.cached = frame.clone();
                return Ok(frame);
            }
            match self.hook_channel.clone() {
                Some(channel) => {
                    if let Err(err) = self.wait_for_signal(&channel).await {
                        tracing::warn!(pane = %self.pane, error = %err, "Hook wait failed, polling instead");
                        self.hook_channel = None;
                        self.wait_strategy = WaitStrategy::Poll;
                    }
                }
                None => sleep(self.poll_interval).await,
            }
        }
    }

    async fn send_keys(&mut self, keys: &[Key]) -> Result<()> {
        for args in send_keys_commands(&self.pane, keys)? {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            self.run(&args).await?;
        }
        Ok(())
    }

    async fn display_message(
        &mut self,
        text: &str,
        duration: Duration,
        modal: bool,
    ) -> Result<()> {
        let Some(args) = display_message_args(&self.pane, text, duration, modal) else {
            return Ok(());
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args).await?;
        Ok(())
    }
}

/// Session name of a `session:window.pane` target
#[must_use]
pub fn session_of(pane: &str) -> &str {
    pane.split(':').next().unwrap_or(pane)
}

fn hook_channel_name(pane: &str) -> String {
    let sanitized: String = pane
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("nha-activity-{sanitized}")
}

/// Build `send-keys` invocations: literal runs use `-l --`, named keys don't
pub fn send_keys_commands(pane: &str, keys: &[Key]) -> Result<Vec<Vec<String>>> {
    if keys.is_empty() {
        return Err(Error::InvalidInput(
            "Attempt to send empty keys into tmux pane".to_string(),
        ));
    }

    let base = || vec!["send-keys".to_string(), "-t".to_string(), pane.to_string()];
    let mut commands: Vec<Vec<String>> = Vec::new();
    let mut literal = String::new();
    let mut named: Vec<String> = Vec::new();

    let flush_literal = |literal: &mut String, commands: &mut Vec<Vec<String>>| {
        if !literal.is_empty() {
            let mut args = base();
            args.push("-l".to_string());
            args.push("--".to_string());
            args.push(std::mem::take(literal));
            commands.push(args);
        }
    };
    let flush_named = |named: &mut Vec<String>, commands: &mut Vec<Vec<String>>| {
        if !named.is_empty() {
            let mut args = base();
            args.append(named);
            commands.push(args);
        }
    };

    for key in keys {
        if let Key::Text(text) = key {
            flush_named(&mut named, &mut commands);
            literal.push_str(text);
        } else if let Some(name) = key.tmux_name() {
            flush_literal(&mut literal, &mut commands);
            named.push(name.to_string());
        }
    }
    flush_literal(&mut literal, &mut commands);
    flush_named(&mut named, &mut commands);

    if commands.is_empty() {
        return Err(Error::InvalidInput("Only empty text keys given".to_string()));
    }
    Ok(commands)
}

/// Build the `display-message` invocation, `None` for a zero duration
#[must_use]
pub fn display_message_args(
    pane: &str,
    text: &str,
    duration: Duration,
    modal: bool,
) -> Option<Vec<String>> {
    if duration.is_zero() {
        return None;
    }
    let mut args = vec![
        "display-message".to_string(),
        "-t".to_string(),
        session_of(pane).to_string(),
        "-d".to_string(),
        duration.as_millis().to_string(),
    ];
    if modal {
        args.push("-N".to_string());
    }
    args.push(text.to_string());
    Some(args)
}

/// Categorize tmux stderr into specific BridgeError variants
fn categorize_stderr(stderr: &str, pane: &str) -> BridgeError {
    if stderr.contains("no server running") || stderr.contains("error connecting to") {
        BridgeError::ServerNotRunning
    } else if stderr.contains("can't find pane")
        || stderr.contains("can't find window")
        || stderr.contains("can't find session")
    {
        BridgeError::PaneNotFound(pane.to_string())
    } else {
        BridgeError::CommandFailed(stderr.trim().to_string())
    }
}

/// Categorize I/O errors into specific BridgeError variants
fn categorize_io_error(e: &std::io::Error) -> BridgeError {
    match e.kind() {
        std::io::ErrorKind::NotFound => BridgeError::CliNotFound,
        std::io::ErrorKind::PermissionDenied => {
            BridgeError::CommandFailed("Permission denied".to_string())
        }
        _ => BridgeError::CommandFailed(e.to_string()),
    }
}
