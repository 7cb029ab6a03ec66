//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a partial JSON file only overrides the fields it names.

mod keepalive;
mod server;

pub use keepalive::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 9090 },
///   "keepalive": { "pongWaitMs": 30000, "pingPeriodMs": 27000 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WsGateSettings {
    /// Listener and upgrade settings.
    pub server: ServerSettings,
    /// Per-connection keepalive timings.
    pub keepalive: KeepaliveSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for WsGateSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            keepalive: KeepaliveSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl WsGateSettings {
    /// Correct invalid keepalive timings.
    ///
    /// Called automatically during loading. Bad values are replaced with a
    /// warning rather than rejected.
    pub fn validate(&mut self) {
        let ka = &mut self.keepalive;
        if ka.write_wait_ms == 0 {
            tracing::warn!(
                "write_wait_ms is 0, reset to {}",
                keepalive::DEFAULT_WRITE_WAIT_MS
            );
            ka.write_wait_ms = keepalive::DEFAULT_WRITE_WAIT_MS;
        }
        if ka.pong_wait_ms == 0 {
            tracing::warn!(
                "pong_wait_ms is 0, reset to {}",
                keepalive::DEFAULT_PONG_WAIT_MS
            );
            ka.pong_wait_ms = keepalive::DEFAULT_PONG_WAIT_MS;
        }
        if ka.write_wait_ms > keepalive::MAX_WAIT_MS {
            tracing::warn!(
                "write_wait_ms ({}) exceeds {}, capped",
                ka.write_wait_ms,
                keepalive::MAX_WAIT_MS
            );
            ka.write_wait_ms = keepalive::MAX_WAIT_MS;
        }
        if ka.pong_wait_ms > keepalive::MAX_WAIT_MS {
            tracing::warn!(
                "pong_wait_ms ({}) exceeds {}, capped",
                ka.pong_wait_ms,
                keepalive::MAX_WAIT_MS
            );
            ka.pong_wait_ms = keepalive::MAX_WAIT_MS;
        }
        if ka.ping_period_ms == 0 || ka.ping_period_ms >= ka.pong_wait_ms {
            let corrected = (ka.pong_wait_ms / 10 * 9).max(1);
            tracing::warn!(
                "ping_period_ms ({}) must be below pong_wait_ms ({}), corrected to {corrected}",
                ka.ping_period_ms,
                ka.pong_wait_ms
            );
            ka.ping_period_ms = corrected;
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Base filter level (`RUST_LOG` overrides it).
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
