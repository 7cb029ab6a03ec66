//! Error types for connections, sessions, and the server.

use std::time::Duration;

/// Errors from writing to or closing a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The connection was already closed.
    #[error("connection closed")]
    Closed,

    /// A frame could not be written within the write deadline.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The underlying socket failed.
    #[error("websocket transport error: {0}")]
    Transport(#[from] axum::Error),
}

/// Errors a [`Session`](crate::session::Session) returns to end its connection.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session refused the connection.
    #[error("session rejected connection: {0}")]
    Rejected(String),

    /// An inbound message could not be handled.
    #[error("message handling failed: {0}")]
    Message(String),

    /// Any other failure inside the session.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<ConnectionError> for SessionError {
    fn from(e: ConnectionError) -> Self {
        Self::Other(Box::new(e))
    }
}

/// Errors from starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that failed.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serving failed after binding.
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}
