//! # wsgate-core
//!
//! Shared vocabulary for the wsgate crates:
//!
//! - **Branded IDs**: [`ids::ConnectionId`] as a newtype over a UUID v7
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` stack
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `wsgate-server` and `wsgate-agent`.

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
