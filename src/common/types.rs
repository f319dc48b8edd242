use serde::{Deserialize, Serialize};

/// Tin nhắn server phát tới mọi client trong phòng.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub nickname: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(nickname: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            content: content.into(),
        }
    }

    /// Plain text form of a log line: `nickname: content`.
    pub fn display_text(&self) -> String {
        format!("{}: {}", self.nickname, self.content)
    }
}

/// Payload of the outbound `message` event. The server attaches the nickname
/// from the session, so the client never sends one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub content: String,
}

impl OutgoingMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_joins_nickname_and_content() {
        let message = ChatMessage::new("alice", "hi");
        assert_eq!(message.display_text(), "alice: hi");
    }

    #[test]
    fn inbound_payload_ignores_extra_fields() {
        let message: ChatMessage = serde_json::from_str(
            r#"{"content":"hi","nickname":"alice","timestamp":"2024-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(message, ChatMessage::new("alice", "hi"));
    }

    #[test]
    fn outgoing_payload_has_only_content() {
        let value = serde_json::to_value(OutgoingMessage::new("hello")).unwrap();
        assert_eq!(value, serde_json::json!({ "content": "hello" }));
    }
}
