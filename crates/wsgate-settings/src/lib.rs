//! # wsgate-settings
//!
//! Configuration for the wsgate WebSocket adapter.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`WsGateSettings::default()`]
//! 2. **User file**: `~/.wsgate/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `WSGATE_*` overrides (highest priority)
//!
//! Loading always finishes with [`WsGateSettings::validate`], so callers get
//! keepalive timings that are safe to hand to the server.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::*;
