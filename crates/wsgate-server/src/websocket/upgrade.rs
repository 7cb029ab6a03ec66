//! HTTP → WebSocket upgrade.
//!
//! Every request that reaches this handler is upgraded. Origin is never
//! checked; a request that is not a valid upgrade is answered with the
//! library's rejection and no session is created.

use std::net::SocketAddr;

use axum::extract::connect_info::{ConnectInfo, Connected};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::serve::IncomingStream;
use metrics::counter;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use super::connection::{WsConnection, split_socket};
use crate::metrics::WS_UPGRADE_FAILURES_TOTAL;
use crate::server::AppState;

/// Both ends of an accepted TCP connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerAddrs {
    /// Address the server accepted on.
    pub local: SocketAddr,
    /// Address of the client.
    pub remote: SocketAddr,
}

impl Connected<IncomingStream<'_, TcpListener>> for PeerAddrs {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let remote = *stream.remote_addr();
        let local = stream
            .io()
            .local_addr()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)));
        Self { local, remote }
    }
}

/// Upgrade any request to a WebSocket and hand the socket to a new session.
pub(crate) async fn upgrade(
    State(state): State<AppState>,
    ConnectInfo(addrs): ConnectInfo<PeerAddrs>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            counter!(WS_UPGRADE_FAILURES_TOTAL).increment(1);
            warn!(remote = %addrs.remote, reason = %rejection, "network upgrade failed");
            return rejection.into_response();
        }
    };

    let settings = &state.server;
    let mut ws = ws
        .read_buffer_size(settings.read_buffer_size)
        .write_buffer_size(settings.write_buffer_size);
    if let Some(max) = settings.max_message_size {
        ws = ws.max_message_size(max);
    }

    debug!(remote = %addrs.remote, "upgrading connection");
    let remote = addrs.remote;
    ws.on_failed_upgrade(move |e| {
        counter!(WS_UPGRADE_FAILURES_TOTAL).increment(1);
        warn!(%remote, error = %e, "network upgrade failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, state, addrs))
}

/// Bind a fresh session to the socket and serve it until it closes.
async fn handle_socket(socket: WebSocket, state: AppState, addrs: PeerAddrs) {
    // Counts as a live task until the connection is torn down.
    let _task = state.tracker.token();
    let (sink, stream) = split_socket(socket);
    let session = state.factory.create();
    let conn = WsConnection::new(
        sink,
        session,
        addrs.local,
        addrs.remote,
        state.keepalive,
        &state.shutdown,
    );
    conn.serve(stream).await;
}
