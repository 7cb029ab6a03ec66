//! WebSocket upgrade, per-connection pumps, and heartbeat.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `upgrade` | HTTP upgrade handler, session creation per socket |
//! | `connection` | Read loop, frame writes, close-once teardown |
//! | `heartbeat` | Periodic ping and keepalive timings |
//!
//! ## Data Flow
//!
//! `upgrade` → `connection` (read loop → `Session::on_message`).
//! `heartbeat` pings on the serving task; `Session` writes via `WsConnection::write`.

pub mod connection;
pub mod heartbeat;
pub mod upgrade;
