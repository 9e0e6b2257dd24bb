//! nha-core: core library for the NetHack assistant
//!
//! Watches a tty NetHack session running in a tmux pane, infers hidden item
//! identities from shop prices and automates a few repetitive maneuvers.
//!
//! # Architecture
//!
//! ```text
//! tmux pane → FrameBridge → Monitor (state machine) → keystrokes back
//!                              ↓
//!              priceid / abbrev (pure)   persistence (snapshot)
//! ```
//!
//! # Modules
//!
//! - `tmux`: frame bridge over the tmux CLI
//! - `frame`: immutable screen snapshots and search helpers
//! - `boxes`: bordered panel detection
//! - `patterns`: game text patterns and markers
//! - `catalog`: static cost and appearance tables
//! - `priceid`: base cost deduction
//! - `abbrev`: call label abbreviation
//! - `monitor`: per-tick state machine
//! - `persistence`: learned-facts snapshot file
//! - `config`, `logging`, `error`: ambient plumbing
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod abbrev;
pub mod boxes;
pub mod catalog;
pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod monitor;
pub mod patterns;
pub mod persistence;
pub mod priceid;
pub mod tmux;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
