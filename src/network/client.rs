use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::common::{
    ChatMessage, ClientError, NetworkCommand, NetworkEvent, OutgoingMessage, SubscriptionId,
};

use super::packet::{EnginePacket, Handshake, SocketPacket};
use super::transport::{self, ConnectOptions, WsStream};

/// Event name used in both directions by the chat room.
pub const MESSAGE_EVENT: &str = "message";

const CLIENT_DISCONNECT: &str = "disconnected by client";

type WsSink = SplitSink<WsStream, WsMessage>;

enum Flow {
    Continue,
    /// The server pinged; push the heartbeat deadline back.
    Heartbeat,
    End(String),
}

/// Background task owning the socket. The UI talks to it only through channels.
///
/// The task never waits on the UI: subscriber and event queues are fed with
/// `try_send`, so a window that stops repainting cannot stall the heartbeat.
pub struct SocketClient {
    options: ConnectOptions,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
    subscribers: Vec<(SubscriptionId, mpsc::Sender<ChatMessage>)>,
    /// Emits issued before the namespace accepted us.
    pending: Vec<OutgoingMessage>,
    joined: bool,
    max_payload: Option<u64>,
}

impl SocketClient {
    pub fn new(
        options: ConnectOptions,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        Self {
            options,
            event_sender,
            command_receiver,
            subscribers: Vec::new(),
            pending: Vec::new(),
            joined: false,
            max_payload: None,
        }
    }

    pub async fn run(mut self) -> Result<(), ClientError> {
        let result = self.session().await;
        let mut reason = match &result {
            Ok(reason) => reason.clone(),
            Err(err) => err.to_string(),
        };
        if !self.pending.is_empty() {
            reason = format!("{reason} ({} unsent messages dropped)", self.pending.len());
        }
        log::info!("Socket session ended: {reason}");

        // Sự kiện cuối cùng: chờ UI nhận, task không còn việc gì khác
        if let Err(err) = self
            .event_sender
            .send(NetworkEvent::Disconnected { reason })
            .await
        {
            log::debug!("UI is gone, dropping event: {err}");
        }
        result.map(|_| ())
    }

    async fn session(&mut self) -> Result<String, ClientError> {
        let Some((stream, handshake)) = self.establish().await? else {
            return Ok(CLIENT_DISCONNECT.to_string());
        };
        log::info!(
            "Engine.IO session {} open (ping interval {}ms, timeout {}ms)",
            handshake.sid,
            handshake.ping_interval,
            handshake.ping_timeout
        );
        self.max_payload = handshake.max_payload;

        let (mut ws_tx, mut ws_rx) = stream.split();
        send_socket_packet(&mut ws_tx, SocketPacket::connect(&self.options.namespace)).await?;

        let heartbeat = handshake.heartbeat_window();
        let deadline = tokio::time::sleep(heartbeat);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                command = self.command_receiver.recv() => {
                    let command = command.unwrap_or(NetworkCommand::Disconnect);
                    if let Flow::End(reason) = self.handle_command(command, &mut ws_tx).await? {
                        return Ok(reason);
                    }
                }
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            match self.handle_text(&text, &mut ws_tx).await? {
                                Flow::Continue => {}
                                Flow::Heartbeat => deadline.as_mut().reset(Instant::now() + heartbeat),
                                Flow::End(reason) => return Ok(reason),
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            log::info!("Server closed the WebSocket: {frame:?}");
                            return Ok("server closed the connection".to_string());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => return Err(err.into()),
                        None => return Ok("server closed the connection".to_string()),
                    }
                }
                () = &mut deadline => {
                    return Ok(format!("ping timeout after {}ms", heartbeat.as_millis()));
                }
            }
        }
    }

    /// Open the transport while still serving commands. `None` means the UI
    /// asked to disconnect before the handshake finished.
    async fn establish(&mut self) -> Result<Option<(WsStream, Handshake)>, ClientError> {
        let options = self.options.clone();
        let timeout = options.connect_timeout;
        let open = tokio::time::timeout(timeout, transport::open(&options));
        tokio::pin!(open);

        loop {
            tokio::select! {
                biased;

                command = self.command_receiver.recv() => {
                    match command.unwrap_or(NetworkCommand::Disconnect) {
                        NetworkCommand::Disconnect => return Ok(None),
                        NetworkCommand::Emit(message) => self.pending.push(message),
                        NetworkCommand::Subscribe { id, sender } => self.add_subscriber(id, sender),
                        NetworkCommand::Unsubscribe(id) => self.remove_subscriber(id),
                    }
                }
                opened = &mut open => {
                    return match opened {
                        Ok(result) => result.map(Some),
                        Err(_) => Err(ClientError::Handshake(format!(
                            "no answer from server within {}ms",
                            timeout.as_millis()
                        ))),
                    };
                }
            }
        }
    }

    async fn handle_command(
        &mut self,
        command: NetworkCommand,
        ws_tx: &mut WsSink,
    ) -> Result<Flow, ClientError> {
        match command {
            NetworkCommand::Emit(message) => {
                if self.joined {
                    self.emit(message, ws_tx).await?;
                } else {
                    self.pending.push(message);
                }
            }
            NetworkCommand::Subscribe { id, sender } => self.add_subscriber(id, sender),
            NetworkCommand::Unsubscribe(id) => self.remove_subscriber(id),
            NetworkCommand::Disconnect => {
                self.leave(ws_tx).await;
                return Ok(Flow::End(CLIENT_DISCONNECT.to_string()));
            }
        }
        Ok(Flow::Continue)
    }

    fn add_subscriber(&mut self, id: SubscriptionId, sender: mpsc::Sender<ChatMessage>) {
        log::debug!("Subscription {} registered", id.0);
        self.subscribers.push((id, sender));
    }

    fn remove_subscriber(&mut self, id: SubscriptionId) {
        log::debug!("Subscription {} removed", id.0);
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
    }

    async fn handle_text(&mut self, text: &str, ws_tx: &mut WsSink) -> Result<Flow, ClientError> {
        let packet = match EnginePacket::decode(text) {
            Ok(packet) => packet,
            Err(err) => {
                self.report(format!("Ignoring malformed frame: {err}"));
                return Ok(Flow::Continue);
            }
        };

        match packet {
            EnginePacket::Ping(data) => {
                ws_tx
                    .send(WsMessage::Text(EnginePacket::Pong(data).encode()))
                    .await?;
                Ok(Flow::Heartbeat)
            }
            EnginePacket::Message(data) => self.handle_socket_packet(&data, ws_tx).await,
            EnginePacket::Close => Ok(Flow::End("server closed the session".to_string())),
            other => {
                log::debug!("Ignoring Engine.IO packet {other:?}");
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_socket_packet(
        &mut self,
        data: &str,
        ws_tx: &mut WsSink,
    ) -> Result<Flow, ClientError> {
        let packet = match SocketPacket::decode(data) {
            Ok(packet) => packet,
            Err(err) => {
                self.report(format!("Ignoring malformed Socket.IO packet: {err}"));
                return Ok(Flow::Continue);
            }
        };

        if packet.namespace() != self.options.namespace {
            log::debug!("Ignoring packet for namespace {}", packet.namespace());
            return Ok(Flow::Continue);
        }

        match packet {
            SocketPacket::Connect { data, .. } => {
                let sid = data
                    .as_ref()
                    .and_then(|data| data.get("sid"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                log::info!("Joined namespace {} as {sid}", self.options.namespace);
                self.joined = true;
                self.notify(NetworkEvent::Connected { sid });

                for message in std::mem::take(&mut self.pending) {
                    self.emit(message, ws_tx).await?;
                }
                Ok(Flow::Continue)
            }
            SocketPacket::ConnectError { data, .. } => {
                let message = data
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| data.to_string());
                Err(ClientError::Refused(message))
            }
            SocketPacket::Disconnect { .. } => {
                Ok(Flow::End("server left the namespace".to_string()))
            }
            SocketPacket::Event { name, args, .. } => {
                self.handle_event(&name, args);
                Ok(Flow::Continue)
            }
            SocketPacket::Ack { id, .. } => {
                log::debug!("Ignoring ack {id}");
                Ok(Flow::Continue)
            }
        }
    }

    fn handle_event(&mut self, name: &str, args: Vec<Value>) {
        if name != MESSAGE_EVENT {
            log::debug!("Ignoring `{name}` event");
            return;
        }

        let Some(payload) = args.into_iter().next() else {
            self.report("`message` event without payload".to_string());
            return;
        };

        match serde_json::from_value::<ChatMessage>(payload) {
            Ok(message) => self.dispatch(message),
            Err(err) => self.report(format!("Malformed `message` payload: {err}")),
        }
    }

    fn dispatch(&mut self, message: ChatMessage) {
        self.subscribers
            .retain(|(id, sender)| match sender.try_send(message.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    log::warn!("Subscription {} is not draining, message dropped", id.0);
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("Subscription {} dropped its receiver", id.0);
                    false
                }
            });
    }

    async fn emit(&mut self, message: OutgoingMessage, ws_tx: &mut WsSink) -> Result<(), ClientError> {
        let payload = serde_json::to_value(&message)?;
        let frame = EnginePacket::Message(
            SocketPacket::event(&self.options.namespace, MESSAGE_EVENT, payload).encode(),
        )
        .encode();

        if let Some(limit) = self.max_payload {
            if frame.len() as u64 > limit {
                self.report(format!(
                    "Message of {} bytes exceeds the server limit of {limit} bytes",
                    frame.len()
                ));
                return Ok(());
            }
        }

        ws_tx.send(WsMessage::Text(frame)).await?;
        Ok(())
    }

    async fn leave(&mut self, ws_tx: &mut WsSink) {
        if self.joined {
            let packet = SocketPacket::disconnect(&self.options.namespace);
            if let Err(err) = send_socket_packet(ws_tx, packet).await {
                log::debug!("Failed to leave namespace: {err}");
            }
        }
        if let Err(err) = ws_tx
            .send(WsMessage::Text(EnginePacket::Close.encode()))
            .await
        {
            log::debug!("Failed to send close packet: {err}");
        }
        if let Err(err) = ws_tx.close().await {
            log::debug!("Failed to close WebSocket: {err}");
        }
    }

    fn notify(&self, event: NetworkEvent) {
        match self.event_sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!("Event queue full, dropping {event:?}");
            }
            Err(TrySendError::Closed(event)) => {
                log::debug!("UI is gone, dropping {event:?}");
            }
        }
    }

    fn report(&self, message: String) {
        log::warn!("{message}");
        self.notify(NetworkEvent::ProtocolError(message));
    }
}

async fn send_socket_packet(ws_tx: &mut WsSink, packet: SocketPacket) -> Result<(), ClientError> {
    ws_tx
        .send(WsMessage::Text(EnginePacket::Message(packet.encode()).encode()))
        .await?;
    Ok(())
}
