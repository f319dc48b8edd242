use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";

/// How the socket reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Open the WebSocket directly.
    #[default]
    Websocket,
    /// Long-polling handshake first, then upgrade to WebSocket (browser default).
    PollingUpgrade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    /// `None` behaves like a page served on the scheme's default port.
    pub port: Option<u16>,
    /// Mount path of the Socket.IO server.
    pub path: String,
    pub namespace: String,
    pub transport: TransportKind,
    /// Raw `Cookie` header, e.g. `session=...` copied from a logged-in browser.
    pub cookie: Option<String>,
    /// Give up on the handshake after this long (the browser client waits 20s).
    pub connect_timeout_ms: u64,
    pub window_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: Some(5000),
            path: "socket.io".to_string(),
            namespace: "/".to_string(),
            transport: TransportKind::Websocket,
            cookie: None,
            connect_timeout_ms: 20_000,
            window_title: "Chatroom".to_string(),
        }
    }
}

impl AppConfig {
    /// `http://<host>:<port>`, the origin the chat page would have been served from.
    pub fn endpoint(&self) -> String {
        match self.port {
            Some(port) => format!("http://{}:{}", self.host, port),
            None => format!("http://{}", self.host),
        }
    }

    /// Apply command-line / environment overrides on top of the file values.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = Some(port);
        }
        if let Some(transport) = overrides.transport {
            self.transport = transport;
        }
        if let Some(cookie) = overrides.cookie {
            self.cookie = Some(cookie);
        }
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub transport: Option<TransportKind>,
    pub cookie: Option<String>,
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn endpoint_uses_host_and_port() {
        let config = AppConfig {
            host: "chat.local".to_string(),
            port: Some(8080),
            ..AppConfig::default()
        };
        assert_eq!(config.endpoint(), "http://chat.local:8080");
    }

    #[test]
    fn endpoint_without_port_falls_back_to_scheme_default() {
        let config = AppConfig {
            port: None,
            ..AppConfig::default()
        };
        assert_eq!(config.endpoint(), "http://localhost");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(load_config(path.to_str().unwrap()), AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_absent_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host":"10.0.0.7","transport":"polling-upgrade"}}"#).unwrap();

        let config = load_config(file.path().to_str().unwrap());
        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, Some(5000));
        assert_eq!(config.transport, TransportKind::PollingUpgrade);
        assert_eq!(config.namespace, "/");
        assert_eq!(config.connect_timeout_ms, 20_000);
    }

    #[test]
    fn unparsable_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert_eq!(load_config(file.path().to_str().unwrap()), AppConfig::default());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = AppConfig::default().with_overrides(Overrides {
            host: Some("example.org".to_string()),
            port: Some(9000),
            transport: None,
            cookie: Some("session=abc".to_string()),
        });
        assert_eq!(config.endpoint(), "http://example.org:9000");
        assert_eq!(config.transport, TransportKind::Websocket);
        assert_eq!(config.cookie.as_deref(), Some("session=abc"));
    }
}
