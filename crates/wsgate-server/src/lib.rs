//! # wsgate-server
//!
//! A thin WebSocket adapter: accept an upgrade, wrap the socket in a
//! [`WsConnection`], and pump frames between the socket and an
//! application [`Session`].
//!
//! - **Session**: [`Session`] callbacks and the [`SessionFactory`] that
//!   creates one session per socket
//! - **Connection**: read loop, binary writes, keepalive, idempotent close
//! - **Server**: [`WsServer`] binds, routes every path to the upgrade
//!   endpoint, and closes all connections on shutdown
//! - **Metrics**: connection and message counters via `metrics`
//!
//! ## Crate Position
//!
//! Depends on: wsgate-core, wsgate-settings.
//! Depended on by: wsgate-agent.

#![deny(unsafe_code)]

pub mod errors;
pub mod metrics;
pub mod server;
pub mod session;
pub mod websocket;

pub use errors::{ConnectionError, ServerError, SessionError};
pub use server::WsServer;
pub use session::{Session, SessionFactory};
pub use websocket::connection::WsConnection;
pub use websocket::heartbeat::Keepalive;
pub use websocket::upgrade::PeerAddrs;
