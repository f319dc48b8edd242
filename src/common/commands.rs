use tokio::sync::mpsc;

use super::types::{ChatMessage, OutgoingMessage};

/// Định danh một subscription trên kết nối.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Emit a `message` event carrying only the content.
    Emit(OutgoingMessage),
    /// Start delivering inbound messages to `sender`.
    Subscribe {
        id: SubscriptionId,
        sender: mpsc::Sender<ChatMessage>,
    },
    Unsubscribe(SubscriptionId),
    /// Leave the namespace and close the socket.
    Disconnect,
}
