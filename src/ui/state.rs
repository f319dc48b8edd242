use chrono::{DateTime, Utc};

use crate::common::{ChatMessage, NetworkEvent};

const MAX_STATUS_EVENTS: usize = 100;

/// Sự kiện kết nối hiển thị trong status panel
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected { sid: String },
    Disconnected { reason: String },
}

/// Vị trí cuộn của khung tin nhắn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollState {
    pub offset: f32,
    /// Largest reachable offset: content height minus viewport height.
    pub max_offset: f32,
    jump_pending: bool,
}

impl ScrollState {
    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset;
        self.jump_pending = true;
    }

    /// Consumed by the renderer, which performs the actual jump.
    pub fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_pending)
    }

    /// Record what the scroll area measured this frame.
    pub fn update_from_view(&mut self, offset: f32, content_height: f32, viewport_height: f32) {
        self.max_offset = (content_height - viewport_height).max(0.0);
        self.offset = offset.clamp(0.0, self.max_offset);
    }
}

/// Trạng thái cục bộ của UI.
pub struct AppState {
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    pub scroll: ScrollState,
    pub status: ConnectionStatus,
    pub status_events: Vec<StatusEvent>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            input_text: String::new(),
            scroll: ScrollState::default(),
            status: ConnectionStatus::Connecting,
            status_events: Vec::new(),
        }
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn apply_network_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected { sid } => {
                self.add_status_event("CONNECTED".to_string(), format!("Joined chat as {sid}"));
                self.status = ConnectionStatus::Connected { sid };
            }
            NetworkEvent::Disconnected { reason } => {
                self.add_status_event("DISCONNECTED".to_string(), reason.clone());
                self.status = ConnectionStatus::Disconnected { reason };
            }
            NetworkEvent::ProtocolError(message) => {
                self.add_status_event("PROTOCOL_ERROR".to_string(), message);
            }
        }
    }

    pub fn add_status_event(&mut self, event_type: String, message: String) {
        self.status_events.push(StatusEvent {
            timestamp: Utc::now(),
            event_type,
            message,
        });

        // Giữ tối đa 100 events để không chiếm quá nhiều bộ nhớ
        if self.status_events.len() > MAX_STATUS_EVENTS {
            self.status_events.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_to_bottom_is_idempotent() {
        let mut scroll = ScrollState::default();
        scroll.update_from_view(0.0, 500.0, 200.0);

        scroll.scroll_to_bottom();
        let first = scroll.offset;
        scroll.scroll_to_bottom();

        assert_eq!(first, 300.0);
        assert_eq!(scroll.offset, first);
    }

    #[test]
    fn short_content_cannot_scroll() {
        let mut scroll = ScrollState::default();
        scroll.update_from_view(40.0, 100.0, 200.0);
        assert_eq!(scroll.max_offset, 0.0);
        assert_eq!(scroll.offset, 0.0);
    }

    #[test]
    fn jump_is_consumed_once() {
        let mut scroll = ScrollState::default();
        scroll.scroll_to_bottom();
        assert!(scroll.take_jump());
        assert!(!scroll.take_jump());
    }

    #[test]
    fn network_events_drive_status() {
        let mut state = AppState::new();
        assert_eq!(state.status, ConnectionStatus::Connecting);

        state.apply_network_event(NetworkEvent::Connected {
            sid: "abc".to_string(),
        });
        assert_eq!(
            state.status,
            ConnectionStatus::Connected {
                sid: "abc".to_string()
            }
        );

        state.apply_network_event(NetworkEvent::ProtocolError("bad frame".to_string()));
        state.apply_network_event(NetworkEvent::Disconnected {
            reason: "ping timeout after 45000ms".to_string(),
        });
        assert!(matches!(state.status, ConnectionStatus::Disconnected { .. }));

        let kinds: Vec<_> = state
            .status_events
            .iter()
            .map(|event| event.event_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["CONNECTED", "PROTOCOL_ERROR", "DISCONNECTED"]);
    }

    #[test]
    fn status_events_are_capped() {
        let mut state = AppState::new();
        for i in 0..150 {
            state.add_status_event("PROTOCOL_ERROR".to_string(), format!("event {i}"));
        }
        assert_eq!(state.status_events.len(), MAX_STATUS_EVENTS);
        assert_eq!(state.status_events[0].message, "event 50");
    }
}
