//! Demo session that writes every inbound message back to the peer.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use wsgate_server::{Session, SessionError, WsConnection};

/// Echoes each message on the connection it arrived on.
#[derive(Default)]
pub(crate) struct EchoSession {
    conn: Mutex<Option<Arc<WsConnection>>>,
}

impl EchoSession {
    /// Factory entry point: one fresh session per connection.
    pub(crate) fn create() -> Arc<dyn Session> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Session for EchoSession {
    async fn on_connect(&self, conn: Arc<WsConnection>) -> Result<(), SessionError> {
        tracing::debug!(conn_id = %conn.id(), remote = %conn.remote_addr(), "echo session attached");
        *self.conn.lock() = Some(conn);
        Ok(())
    }

    async fn on_message(&self, message: Bytes) -> Result<(), SessionError> {
        let conn = self.conn.lock().clone();
        let Some(conn) = conn else {
            return Ok(());
        };
        conn.write(message).await?;
        Ok(())
    }

    async fn on_disconnect(&self) {
        // Drops the connection handle so the session/connection cycle is broken.
        if let Some(conn) = self.conn.lock().take() {
            tracing::debug!(conn_id = %conn.id(), "echo session detached");
        }
    }
}
