//! Session configuration
//!
//! The pacing values below were tuned on real adapters rather than taken
//! from a datasheet; they are defaults, not guarantees. A TOML file can
//! override any of them:
//!
//! ```toml
//! teardown_reset = true
//!
//! [timing]
//! page_settle_ms = 10
//! byte_delay_us = 1000
//! drain_timeout_ms = 100
//! io_timeout_ms = 1000
//! entry_attempts = 20
//! drain_limit = 1024
//! read_batch = 256
//! ```

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::{BusPirateError, Result};

/// Pacing and timeout parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timing {
    /// Wait after each page write's STOP for the internal write cycle
    pub page_settle_ms: u64,
    /// Pause after each payload byte of a page write
    pub byte_delay_us: u64,
    /// How long a drain read waits before deciding the channel is quiet
    pub drain_timeout_ms: u32,
    /// Read timeout of the serial channel
    pub io_timeout_ms: u64,
    /// Resets sent before bridge mode entry is declared failed
    pub entry_attempts: u32,
    /// Upper bound on reads performed by a single drain
    pub drain_limit: usize,
    /// Bytes requested from the device before collecting their answers
    pub read_batch: usize,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            page_settle_ms: 10,
            byte_delay_us: 1000,
            drain_timeout_ms: 100,
            io_timeout_ms: 1000,
            entry_attempts: 20,
            drain_limit: 1024,
            read_batch: 256,
        }
    }
}

impl Timing {
    /// No pacing at all, for channels that answer synchronously
    pub fn immediate() -> Self {
        Self {
            page_settle_ms: 0,
            byte_delay_us: 0,
            drain_timeout_ms: 0,
            ..Self::default()
        }
    }

    /// Settle delay after a page write
    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    /// Delay after each payload byte
    pub fn byte_delay(&self) -> Duration {
        Duration::from_micros(self.byte_delay_us)
    }

    /// Serial read timeout
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Everything a session needs besides its channel
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Pacing and timeouts
    pub timing: Timing,
    /// On close, hand the adapter back to its text terminal
    pub teardown_reset: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            teardown_reset: true,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BusPirateError::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| BusPirateError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Block for at least `duration`
///
/// `thread::sleep` may return early on some platforms; keep sleeping until
/// the full time has passed. Zero durations return immediately.
pub fn pause(mut duration: Duration) {
    while !duration.is_zero() {
        let now = Instant::now();
        thread::sleep(duration);
        let elapsed = now.elapsed();
        if elapsed >= duration {
            return;
        }
        duration -= elapsed;
    }
}
