//! Per-connection read/write loops and close-once teardown.

use std::fmt;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use wsgate_core::ids::ConnectionId;

use super::heartbeat::{self, Keepalive};
use crate::errors::ConnectionError;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL, WS_MESSAGES_RECEIVED_TOTAL, WS_MESSAGES_SENT_TOTAL,
};
use crate::session::Session;

/// Outbound half of a socket.
pub(crate) type BoxSink = Pin<Box<dyn Sink<Message, Error = axum::Error> + Send>>;
/// Inbound half of a socket.
pub(crate) type BoxStream = Pin<Box<dyn Stream<Item = Result<Message, axum::Error>> + Send>>;

/// Split an upgraded socket into boxed halves.
pub(crate) fn split_socket(socket: WebSocket) -> (BoxSink, BoxStream) {
    let (sink, stream) = socket.split();
    (Box::pin(sink), Box::pin(stream))
}

/// A single accepted WebSocket bound to its [`Session`].
///
/// The read loop runs on its own task; the ping loop runs on the task that
/// called [`serve`](Self::serve). Whichever ends first calls
/// [`close`](Self::close), which stops the other. The session's
/// `on_disconnect` runs only after both loops have stopped.
pub struct WsConnection {
    id: ConnectionId,
    sink: Mutex<BoxSink>,
    session: Arc<dyn Session>,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    keepalive: Keepalive,
    closed: AtomicBool,
    /// Cancelled once the connection is closing; child of the server token.
    done: CancellationToken,
    connected_at: std::time::Instant,
}

impl WsConnection {
    pub(crate) fn new(
        sink: BoxSink,
        session: Arc<dyn Session>,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
        keepalive: Keepalive,
        shutdown: &CancellationToken,
    ) -> Arc<Self> {
        counter!(WS_CONNECTIONS_TOTAL).increment(1);
        gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
        Arc::new(Self {
            id: ConnectionId::new(),
            sink: Mutex::new(sink),
            session,
            local_addr,
            remote_addr,
            keepalive,
            closed: AtomicBool::new(false),
            done: shutdown.child_token(),
            connected_at: std::time::Instant::now(),
        })
    }

    /// Connection identifier used in logs.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Local socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Peer socket address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// The session bound to this connection.
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Time since the socket was accepted.
    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    pub(crate) fn keepalive(&self) -> Keepalive {
        self.keepalive
    }

    pub(crate) fn done_token(&self) -> &CancellationToken {
        &self.done
    }

    /// Drive the connection until it closes.
    ///
    /// Calls `on_connect`, starts the read loop, and runs the ping loop on
    /// the current task. Once both loops have finished, calls
    /// `on_disconnect` exactly once and returns.
    pub(crate) async fn serve(self: Arc<Self>, stream: BoxStream) {
        info!(conn_id = %self.id, remote = %self.remote_addr, "connection opened");

        match self.session.on_connect(Arc::clone(&self)).await {
            Ok(()) => {
                let reader = tokio::spawn(Arc::clone(&self).read_pump(stream));
                heartbeat::ping_loop(&self).await;
                self.close().await;

                if let Err(e) = reader.await {
                    warn!(conn_id = %self.id, error = %e, "read loop task failed");
                }
            }
            Err(e) => {
                warn!(conn_id = %self.id, error = %e, "session refused connection");
                self.close().await;
            }
        }

        // Nothing dispatches to the session past this point.
        self.session.on_disconnect().await;
    }

    async fn read_pump(self: Arc<Self>, mut stream: BoxStream) {
        let pong_wait = self.keepalive.pong_wait;
        let deadline = tokio::time::sleep(pong_wait);
        tokio::pin!(deadline);

        loop {
            let next = tokio::select! {
                biased;
                () = self.done.cancelled() => break,
                () = &mut deadline => {
                    warn!(conn_id = %self.id, ?pong_wait, "network read deadline exceeded");
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(Message::Pong(_))) => {
                    trace!(conn_id = %self.id, "pong received");
                    deadline.as_mut().reset(Instant::now() + pong_wait);
                }
                Some(Ok(Message::Ping(_))) => {
                    trace!(conn_id = %self.id, "ping received");
                }
                Some(Ok(Message::Close(frame))) => {
                    log_close_frame(&self.id, frame.as_ref());
                    break;
                }
                Some(Ok(message)) => {
                    if self.is_closed() || !self.dispatch(message.into_data()).await {
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(conn_id = %self.id, error = %e, "network read failed");
                    break;
                }
                None => {
                    debug!(conn_id = %self.id, "peer stream ended");
                    break;
                }
            }
        }

        self.close().await;
    }

    /// Hand one inbound payload to the session. Returns `false` to stop reading.
    async fn dispatch(&self, payload: Bytes) -> bool {
        counter!(WS_MESSAGES_RECEIVED_TOTAL).increment(1);
        trace!(conn_id = %self.id, len = payload.len(), "message received");
        match self.session.on_message(payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(conn_id = %self.id, error = %e, "session failed to handle message");
                false
            }
        }
    }

    /// Send `payload` to the peer as one binary frame.
    ///
    /// Fails with [`ConnectionError::Closed`] once the connection has closed.
    /// A failed or timed-out write closes the connection.
    pub async fn write(&self, payload: impl Into<Bytes>) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        let payload = payload.into();
        let len = payload.len();
        match self.send_frame(Message::Binary(payload)).await {
            Ok(()) => {
                counter!(WS_MESSAGES_SENT_TOTAL).increment(1);
                trace!(conn_id = %self.id, len, "message sent");
                Ok(())
            }
            Err(_) if self.is_closed() => Err(ConnectionError::Closed),
            Err(e) => {
                warn!(conn_id = %self.id, error = %e, "network write failed");
                self.close().await;
                Err(e)
            }
        }
    }

    pub(crate) async fn send_ping(&self) -> Result<(), ConnectionError> {
        self.send_frame(Message::Ping(Bytes::new())).await
    }

    /// Write one frame, bounded by `write_wait` (including the wait for the sink).
    async fn send_frame(&self, message: Message) -> Result<(), ConnectionError> {
        let write_wait = self.keepalive.write_wait;
        let send = async {
            let mut sink = self.sink.lock().await;
            sink.send(message).await
        };
        match timeout(write_wait, send).await {
            Ok(result) => result.map_err(ConnectionError::from),
            Err(_) => Err(ConnectionError::WriteTimeout(write_wait)),
        }
    }

    /// Close the connection. Idempotent.
    ///
    /// The first call stops both loops and closes the socket. Later calls
    /// return immediately. The session hears about it through
    /// `on_disconnect` once the read loop has drained.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.done.cancel();

        let shutdown = async {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!(conn_id = %self.id, error = %e, "close frame not sent");
            }
            sink.close().await
        };
        match timeout(self.keepalive.write_wait, shutdown).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(conn_id = %self.id, error = %e, "socket close failed"),
            Err(_) => debug!(conn_id = %self.id, "socket close timed out"),
        }

        let lifetime = self.connected_for();
        counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
        gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
        histogram!(WS_CONNECTION_DURATION_SECONDS).record(lifetime.as_secs_f64());
        info!(conn_id = %self.id, remote = %self.remote_addr, ?lifetime, "connection closed");
    }
}

impl fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsConnection")
            .field("id", &self.id)
            .field("local_addr", &self.local_addr)
            .field("remote_addr", &self.remote_addr)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Peers that go away or send no status close quietly; anything else is
/// worth a warning.
fn log_close_frame(id: &ConnectionId, frame: Option<&CloseFrame>) {
    match frame {
        None => debug!(conn_id = %id, "peer closed without status"),
        Some(f) if f.code == close_code::AWAY || f.code == close_code::STATUS => {
            debug!(conn_id = %id, code = f.code, "peer going away");
        }
        Some(f) => {
            warn!(conn_id = %id, code = f.code, reason = %f.reason.as_str(), "peer closed connection");
        }
    }
}
