//! Prometheus metrics recorder and `/metrics` rendering.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Call once at startup,
/// before any metric is recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// WebSocket connections accepted (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket connections closed (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Open WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Data frames handed to sessions (counter).
pub const WS_MESSAGES_RECEIVED_TOTAL: &str = "ws_messages_received_total";
/// Binary frames written for sessions (counter).
pub const WS_MESSAGES_SENT_TOTAL: &str = "ws_messages_sent_total";
/// Pings that could not be written (counter).
pub const WS_PING_FAILURES_TOTAL: &str = "ws_ping_failures_total";
/// Requests that failed the WebSocket upgrade (counter).
pub const WS_UPGRADE_FAILURES_TOTAL: &str = "ws_upgrade_failures_total";
/// Connection lifetime in seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
