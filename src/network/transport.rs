use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::common::ClientError;
use crate::config::{AppConfig, TransportKind};

use super::packet::{EnginePacket, Handshake, decode_payload};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const ENGINE_IO_VERSION: &str = "4";

/// Everything the network task needs to reach the server.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub endpoint: String,
    pub path: String,
    pub namespace: String,
    pub transport: TransportKind,
    pub cookie: Option<String>,
    pub connect_timeout: Duration,
}

impl From<&AppConfig> for ConnectOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            path: config.path.clone(),
            namespace: config.namespace.clone(),
            transport: config.transport,
            cookie: config.cookie.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        }
    }
}

/// Open the socket and complete the Engine.IO handshake.
pub async fn open(options: &ConnectOptions) -> Result<(WsStream, Handshake), ClientError> {
    match options.transport {
        TransportKind::Websocket => open_websocket(options).await,
        TransportKind::PollingUpgrade => open_with_upgrade(options).await,
    }
}

async fn open_websocket(options: &ConnectOptions) -> Result<(WsStream, Handshake), ClientError> {
    let url = websocket_url(options, None)?;
    log::info!("Connecting to {url}");
    let mut stream = connect(options, &url).await?;

    match next_packet(&mut stream).await? {
        EnginePacket::Open(handshake) => Ok((stream, handshake)),
        other => Err(ClientError::Handshake(format!(
            "expected open packet, got {other:?}"
        ))),
    }
}

async fn open_with_upgrade(options: &ConnectOptions) -> Result<(WsStream, Handshake), ClientError> {
    let url = polling_url(options)?;
    log::info!("Polling handshake at {url}");

    // WebSocket leg không đi qua proxy, polling cũng vậy để cùng một đường
    let http = reqwest::Client::builder().no_proxy().build()?;
    let mut request = http.get(url.as_str());
    if let Some(cookie) = &options.cookie {
        request = request.header(reqwest::header::COOKIE, cookie.as_str());
    }
    let body = request.send().await?.error_for_status()?.text().await?;

    let handshake = decode_payload(&body)?
        .into_iter()
        .find_map(|packet| match packet {
            EnginePacket::Open(handshake) => Some(handshake),
            _ => None,
        })
        .ok_or_else(|| ClientError::Handshake("polling response had no open packet".into()))?;

    if !handshake.upgrades.iter().any(|upgrade| upgrade == "websocket") {
        return Err(ClientError::Handshake(
            "server does not offer a websocket upgrade".into(),
        ));
    }

    let url = websocket_url(options, Some(&handshake.sid))?;
    log::info!("Upgrading session {} to {url}", handshake.sid);
    let mut stream = connect(options, &url).await?;

    stream
        .send(WsMessage::Text(EnginePacket::Ping("probe".into()).encode()))
        .await?;
    match next_packet(&mut stream).await? {
        EnginePacket::Pong(data) if data == "probe" => {}
        other => {
            return Err(ClientError::Handshake(format!(
                "unexpected reply to upgrade probe: {other:?}"
            )));
        }
    }
    stream
        .send(WsMessage::Text(EnginePacket::Upgrade.encode()))
        .await?;

    Ok((stream, handshake))
}

async fn connect(options: &ConnectOptions, url: &Url) -> Result<WsStream, ClientError> {
    let mut request = url.as_str().into_client_request()?;
    if let Some(cookie) = &options.cookie {
        let value =
            HeaderValue::from_str(cookie).map_err(|err| ClientError::Header(err.to_string()))?;
        request.headers_mut().insert(header::COOKIE, value);
    }

    let (stream, _response) = connect_async(request).await?;
    Ok(stream)
}

/// Next Engine.IO packet, skipping WebSocket control frames.
pub async fn next_packet<S>(stream: &mut S) -> Result<EnginePacket, ClientError>
where
    S: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => return Ok(EnginePacket::decode(&text)?),
            Some(Ok(WsMessage::Close(_))) | None => {
                return Err(ClientError::Handshake(
                    "server closed the socket during handshake".into(),
                ));
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Err(err.into()),
        }
    }
}

fn base_url(options: &ConnectOptions, transport: &str, sid: Option<&str>) -> Result<Url, ClientError> {
    let mut url = Url::parse(&options.endpoint)?;
    url.set_path(&format!("/{}/", options.path.trim_matches('/')));
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("EIO", ENGINE_IO_VERSION)
            .append_pair("transport", transport);
        if let Some(sid) = sid {
            query.append_pair("sid", sid);
        }
    }
    Ok(url)
}

pub fn websocket_url(options: &ConnectOptions, sid: Option<&str>) -> Result<Url, ClientError> {
    let mut url = base_url(options, "websocket", sid)?;
    // chỉ hỗ trợ ws:// (không build TLS)
    if url.scheme() != "http" {
        return Err(ClientError::Handshake(format!(
            "unsupported scheme `{}`, only http endpoints are supported",
            url.scheme()
        )));
    }
    url.set_scheme("ws")
        .map_err(|_| ClientError::Handshake(format!("cannot switch {url} to ws")))?;
    Ok(url)
}

pub fn polling_url(options: &ConnectOptions) -> Result<Url, ClientError> {
    let mut url = base_url(options, "polling", None)?;
    // cache buster, like the browser client
    url.query_pairs_mut()
        .append_pair("t", &Utc::now().timestamp_millis().to_string());
    Ok(url)
}
