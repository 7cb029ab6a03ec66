//! Periodic ping for connection liveness.
//!
//! The write side pings every `ping_period`; the read side expects a pong
//! within `pong_wait` (see `connection`). A ping that cannot be written in
//! `write_wait` ends the loop, and with it the connection.

use std::time::Duration;

use metrics::counter;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{trace, warn};
use wsgate_settings::{KeepaliveSettings, MAX_WAIT_MS};

use super::connection::WsConnection;
use crate::metrics::WS_PING_FAILURES_TOTAL;

/// Keepalive timings applied to one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keepalive {
    /// Deadline for writing a single frame.
    pub write_wait: Duration,
    /// Deadline for the next pong from the peer.
    pub pong_wait: Duration,
    /// Interval between pings. Must be shorter than `pong_wait`.
    pub ping_period: Duration,
}

/// Settings handed straight to the server may not have been validated;
/// timings are capped so deadline arithmetic cannot overflow.
impl From<&KeepaliveSettings> for Keepalive {
    fn from(s: &KeepaliveSettings) -> Self {
        let cap = Duration::from_millis(MAX_WAIT_MS);
        Self {
            write_wait: s.write_wait().min(cap),
            pong_wait: s.pong_wait().min(cap),
            ping_period: s.ping_period().min(cap),
        }
    }
}

impl Default for Keepalive {
    fn default() -> Self {
        Self::from(&KeepaliveSettings::default())
    }
}

/// Ping the peer every `ping_period` until the connection completes or a
/// ping fails. The first ping goes out one full period after start.
pub(crate) async fn ping_loop(conn: &WsConnection) {
    let period = conn.keepalive().ping_period;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let done = conn.done_token();

    loop {
        tokio::select! {
            () = done.cancelled() => return,
            _ = ticker.tick() => {
                if let Err(e) = conn.send_ping().await {
                    counter!(WS_PING_FAILURES_TOTAL).increment(1);
                    warn!(conn_id = %conn.id(), error = %e, "network write ping failed");
                    return;
                }
                trace!(conn_id = %conn.id(), "ping sent");
            }
        }
    }
}
