//! Listener and upgrade settings.

use serde::{Deserialize, Serialize};

/// Network listener and WebSocket upgrade settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Read buffer size handed to the WebSocket library, in bytes.
    pub read_buffer_size: usize,
    /// Write buffer size handed to the WebSocket library, in bytes.
    pub write_buffer_size: usize,
    /// Largest accepted inbound message. `None` keeps the library default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_message_size: Option<usize>,
}

impl ServerSettings {
    /// `host:port` string suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            read_buffer_size: 1024,
            write_buffer_size: 1024,
            max_message_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8080);
        assert_eq!(s.read_buffer_size, 1024);
        assert_eq!(s.write_buffer_size, 1024);
        assert!(s.max_message_size.is_none());
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let s = ServerSettings {
            host: "127.0.0.1".into(),
            port: 9001,
            ..ServerSettings::default()
        };
        assert_eq!(s.bind_addr(), "127.0.0.1:9001");
    }

    #[test]
    fn serde_camel_case() {
        let json = serde_json::to_value(ServerSettings::default()).unwrap();
        assert!(json.get("readBufferSize").is_some());
        assert!(json.get("writeBufferSize").is_some());
        assert!(json.get("maxMessageSize").is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: ServerSettings =
            serde_json::from_value(serde_json::json!({"port": 7000, "maxMessageSize": 4096}))
                .unwrap();
        assert_eq!(s.port, 7000);
        assert_eq!(s.max_message_size, Some(4096));
        assert_eq!(s.read_buffer_size, 1024);
    }
}
