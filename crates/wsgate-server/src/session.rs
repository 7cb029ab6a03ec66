//! Application-side collaborator for a single connection.
//!
//! The adapter knows nothing about message semantics. Every accepted socket
//! gets a fresh [`Session`] from the server's [`SessionFactory`]; the
//! connection then reports its lifecycle and inbound payloads to it.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::SessionError;
use crate::websocket::connection::WsConnection;

/// Receives lifecycle callbacks and inbound messages for one connection.
///
/// Callback order is always `on_connect`, then zero or more `on_message`,
/// then exactly one `on_disconnect`. If `on_connect` fails, no message is
/// delivered but `on_disconnect` still runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Called once, before the read loop starts.
    ///
    /// Keep `conn` to write to the peer later. Returning an error closes
    /// the connection.
    async fn on_connect(&self, conn: Arc<WsConnection>) -> Result<(), SessionError>;

    /// Called for each binary or text message, in arrival order.
    ///
    /// Returning an error closes the connection.
    async fn on_message(&self, message: Bytes) -> Result<(), SessionError>;

    /// Called exactly once when the connection closes, whatever the cause.
    ///
    /// Runs after the read loop has stopped, so no `on_message` call is in
    /// flight or still to come. Writes from here fail with `Closed`.
    async fn on_disconnect(&self);
}

/// Creates one [`Session`] per accepted connection.
pub trait SessionFactory: Send + Sync + 'static {
    /// Build the session for a newly accepted connection.
    fn create(&self) -> Arc<dyn Session>;
}

impl<F> SessionFactory for F
where
    F: Fn() -> Arc<dyn Session> + Send + Sync + 'static,
{
    fn create(&self) -> Arc<dyn Session> {
        self()
    }
}
