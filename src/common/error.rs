use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::network::packet::PacketError;

/// Lỗi của tầng kết nối.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed packet: {0}")]
    Packet(#[from] PacketError),

    #[error("Invalid header value: {0}")]
    Header(String),

    /// The server did not complete the Engine.IO handshake or upgrade.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The namespace answered CONNECT with CONNECT_ERROR.
    #[error("Connection refused by server: {0}")]
    Refused(String),

    /// The network task has exited; nothing can be sent any more.
    #[error("Connection closed")]
    Closed,

    /// The command queue is full.
    #[error("Connection busy, command dropped")]
    Busy,
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for ClientError {
    fn from(err: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::TrySendError::Full(_) => ClientError::Busy,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => ClientError::Closed,
        }
    }
}
