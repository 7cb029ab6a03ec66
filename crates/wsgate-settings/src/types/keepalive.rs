//! Keepalive timing settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time allowed to write one frame.
pub const DEFAULT_WRITE_WAIT_MS: u64 = 10_000;
/// Default time allowed between pongs from the peer.
pub const DEFAULT_PONG_WAIT_MS: u64 = 60_000;
/// Upper bound for `write_wait_ms` and `pong_wait_ms` (one day).
pub const MAX_WAIT_MS: u64 = 24 * 60 * 60 * 1000;
/// Default ping interval (nine tenths of the pong wait).
pub const DEFAULT_PING_PERIOD_MS: u64 = DEFAULT_PONG_WAIT_MS * 9 / 10;

/// Ping/pong and write deadline timings for each connection.
///
/// `ping_period_ms` must stay below `pong_wait_ms` so a healthy peer always
/// has a ping in flight before its read deadline expires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeepaliveSettings {
    /// Time allowed to write a single frame, in milliseconds.
    pub write_wait_ms: u64,
    /// Time allowed to read the next pong, in milliseconds.
    pub pong_wait_ms: u64,
    /// Interval between pings, in milliseconds.
    pub ping_period_ms: u64,
}

impl KeepaliveSettings {
    /// Write deadline as a [`Duration`].
    pub fn write_wait(&self) -> Duration {
        Duration::from_millis(self.write_wait_ms)
    }

    /// Read deadline as a [`Duration`].
    pub fn pong_wait(&self) -> Duration {
        Duration::from_millis(self.pong_wait_ms)
    }

    /// Ping interval as a [`Duration`].
    pub fn ping_period(&self) -> Duration {
        Duration::from_millis(self.ping_period_ms)
    }
}

impl Default for KeepaliveSettings {
    fn default() -> Self {
        Self {
            write_wait_ms: DEFAULT_WRITE_WAIT_MS,
            pong_wait_ms: DEFAULT_PONG_WAIT_MS,
            ping_period_ms: DEFAULT_PING_PERIOD_MS,
        }
    }
}
