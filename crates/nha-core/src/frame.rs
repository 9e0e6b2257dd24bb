//! Screen frames and the free functions that query them
//!
//! A [`Frame`] is an immutable snapshot of the pane as captured by
//! `tmux capture-pane -p`. Frames are cheap to clone and never mutated;
//! the bridge replaces its cached frame on every capture.
//!
//! Matching is line oriented. With `collapse` set, lines are stripped and
//! joined with single spaces so that messages wrapped over several rows
//! become one searchable string.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// Immutable snapshot of the remote screen
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Frame {
    text: Arc<str>,
}

impl Frame {
    /// Wrap captured pane text
    #[must_use]
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    /// Build a frame from individual screen rows
    #[must_use]
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let joined = lines
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(joined)
    }

    /// Raw text as captured
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Screen rows, top to bottom
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// First screen row (the tty message line)
    #[must_use]
    pub fn top_line(&self) -> &str {
        self.text.lines().next().unwrap_or("")
    }

    /// Plain substring test against the raw text
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Frames are full screens; keep debug output short.
        f.debug_struct("Frame")
            .field("lines", &self.text.lines().count())
            .field("bytes", &self.text.len())
            .finish()
    }
}

impl From<&str> for Frame {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Frame {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Owned result of a pattern search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMatch {
    text: String,
    start: usize,
    groups: Vec<(String, Option<String>)>,
}

impl FrameMatch {
    fn from_captures(regex: &Regex, caps: &regex::Captures<'_>) -> Self {
        let whole = caps.get(0);
        let groups = regex
            .capture_names()
            .flatten()
            .map(|name| {
                (
                    name.to_string(),
                    caps.name(name).map(|m| m.as_str().to_string()),
                )
            })
            .collect();
        Self {
            text: whole.map(|m| m.as_str().to_string()).unwrap_or_default(),
            start: whole.map_or(0, |m| m.start()),
            groups,
        }
    }

    /// The whole matched text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Byte offset of the match in the searched string
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Named group value, `None` when the group did not participate
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(group, _)| group == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Named group parsed as a number
    #[must_use]
    pub fn number(&self, name: &str) -> Option<u32> {
        self.group(name).and_then(|value| value.parse().ok())
    }
}

/// Join stripped lines with single spaces
#[must_use]
pub fn collapse(frame: &Frame) -> String {
    frame.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

fn haystack(frame: &Frame, collapse_whitespace: bool) -> String {
    if collapse_whitespace {
        collapse(frame)
    } else {
        frame.as_str().to_string()
    }
}

/// Find the first match of `regex` in the frame
#[must_use]
pub fn search(frame: &Frame, regex: &Regex, collapse_whitespace: bool) -> Option<FrameMatch> {
    if collapse_whitespace {
        let text = collapse(frame);
        regex
            .captures(&text)
            .map(|caps| FrameMatch::from_captures(regex, &caps))
    } else {
        regex
            .captures(frame.as_str())
            .map(|caps| FrameMatch::from_captures(regex, &caps))
    }
}

/// Lazily iterate over every non-overlapping match in the frame
#[must_use]
pub fn search_all(frame: &Frame, regex: &Regex, collapse_whitespace: bool) -> FrameMatches {
    FrameMatches {
        haystack: haystack(frame, collapse_whitespace),
        regex: regex.clone(),
        position: 0,
        finished: false,
    }
}

/// Single-pass iterator over matches in one frame
///
/// Owns its (possibly collapsed) haystack so the cached frame can be
/// replaced while matches are still being consumed.
#[derive(Debug)]
pub struct FrameMatches {
    haystack: String,
    regex: Regex,
    position: usize,
    finished: bool,
}

impl Iterator for FrameMatches {
    type Item = FrameMatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.position > self.haystack.len() {
            return None;
        }
        let Some(caps) = self.regex.captures_at(&self.haystack, self.position) else {
            self.finished = true;
            return None;
        };
        let whole = caps.get(0)?;
        self.position = if whole.end() == whole.start() {
            // Step past an empty match without splitting a code point.
            self.haystack[whole.end()..]
                .chars()
                .next()
                .map_or(self.haystack.len() + 1, |ch| whole.end() + ch.len_utf8())
        } else {
            whole.end()
        };
        Some(FrameMatch::from_captures(&self.regex, &caps))
    }
}

/// Cut a rectangle out of the frame, padding short rows with spaces
///
/// Coordinates are in characters, not bytes.
#[must_use]
pub fn extract_rectangle(frame: &Frame, x: usize, y: usize, width: usize, height: usize) -> String {
    frame
        .as_str()
        .split('\n')
        .skip(y)
        .take(height)
        .map(|line| {
            let mut cut: String = line.chars().skip(x).take(width).collect();
            let missing = width.saturating_sub(cut.chars().count());
            cut.extend(std::iter::repeat_n(' ', missing));
            cut
        })
        .collect::<Vec<_>>()
        .join("\n")
}
