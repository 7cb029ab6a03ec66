//! Settings loading: defaults, user file, environment overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{Result, SettingsError};
use crate::types::WsGateSettings;

/// Directory under `$HOME` holding the settings file.
const SETTINGS_DIR: &str = ".wsgate";
/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Default settings file path (`~/.wsgate/settings.json`).
///
/// Falls back to the current directory when `HOME` is unset.
pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(SETTINGS_DIR).join(SETTINGS_FILE)
}

/// Load settings from the default path.
pub fn load_settings() -> Result<WsGateSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path`, deep-merged over defaults, with env overrides.
///
/// A missing file is not an error: defaults (plus env overrides) are returned.
pub fn load_settings_from_path(path: &Path) -> Result<WsGateSettings> {
    let defaults = serde_json::to_value(WsGateSettings::default())?;
    let merged = match std::fs::read_to_string(path) {
        Ok(raw) => {
            let user: Value = serde_json::from_str(&raw)?;
            deep_merge(defaults, user)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(?path, "no settings file, using defaults");
            defaults
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let mut settings: WsGateSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate();
    Ok(settings)
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

/// Apply `WSGATE_*` overrides using `lookup` to read variables.
///
/// Unparseable values are ignored with a warning.
pub fn apply_env_overrides(
    settings: &mut WsGateSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(host) = lookup("WSGATE_HOST") {
        settings.server.host = host;
    }
    if let Some(port) = parse_var(&lookup, "WSGATE_PORT") {
        settings.server.port = port;
    }
    if let Some(ms) = parse_var(&lookup, "WSGATE_PING_PERIOD_MS") {
        settings.keepalive.ping_period_ms = ms;
    }
    if let Some(ms) = parse_var(&lookup, "WSGATE_PONG_WAIT_MS") {
        settings.keepalive.pong_wait_ms = ms;
    }
    if let Some(ms) = parse_var(&lookup, "WSGATE_WRITE_WAIT_MS") {
        settings.keepalive.write_wait_ms = ms;
    }
    if let Some(level) = lookup("WSGATE_LOG_LEVEL") {
        settings.logging.level = level;
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
