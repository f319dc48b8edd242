use tokio::sync::mpsc;

use crate::common::{
    ChatMessage, ClientError, NetworkCommand, NetworkEvent, OutgoingMessage, SubscriptionId,
};

const SUBSCRIPTION_CAPACITY: usize = 256;

/// Owned handle to the network task.
///
/// Dropping the handle closes the command channel, which the task treats as a
/// disconnect request.
pub struct ChatConnection {
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
    next_subscription: u64,
}

/// Stream of inbound chat messages registered with [`ChatConnection::subscribe`].
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<ChatMessage>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn try_recv(&mut self) -> Option<ChatMessage> {
        self.receiver.try_recv().ok()
    }

    /// `None` once the subscription was removed or the connection ended.
    pub async fn recv(&mut self) -> Option<ChatMessage> {
        self.receiver.recv().await
    }
}

impl ChatConnection {
    pub fn new(
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        Self {
            command_sender,
            event_receiver,
            next_subscription: 0,
        }
    }

    pub fn subscribe(&mut self) -> Result<Subscription, ClientError> {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_CAPACITY);

        self.command_sender
            .try_send(NetworkCommand::Subscribe { id, sender })?;
        Ok(Subscription { id, receiver })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<(), ClientError> {
        self.command_sender
            .try_send(NetworkCommand::Unsubscribe(id))?;
        Ok(())
    }

    pub fn emit(&self, message: OutgoingMessage) -> Result<(), ClientError> {
        self.command_sender.try_send(NetworkCommand::Emit(message))?;
        Ok(())
    }

    /// Ask the network task to leave and close the socket. Safe to call twice.
    pub fn disconnect(&self) {
        if let Err(err) = self.command_sender.try_send(NetworkCommand::Disconnect) {
            log::debug!("Disconnect not delivered: {err}");
        }
    }

    pub fn try_next_event(&mut self) -> Option<NetworkEvent> {
        self.event_receiver.try_recv().ok()
    }

    pub async fn next_event(&mut self) -> Option<NetworkEvent> {
        self.event_receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(capacity: usize) -> (ChatConnection, mpsc::Receiver<NetworkCommand>) {
        let (command_sender, command_receiver) = mpsc::channel(capacity);
        let (_event_sender, event_receiver) = mpsc::channel(1);
        (ChatConnection::new(command_sender, event_receiver), command_receiver)
    }

    #[test]
    fn subscriptions_get_distinct_ids() {
        let (mut connection, mut commands) = connection(4);
        let first = connection.subscribe().unwrap();
        let second = connection.subscribe().unwrap();
        assert_ne!(first.id(), second.id());

        match commands.try_recv().unwrap() {
            NetworkCommand::Subscribe { id, .. } => assert_eq!(id, first.id()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn subscriber_sees_messages_from_its_sender() {
        let (mut connection, mut commands) = connection(4);
        let mut subscription = connection.subscribe().unwrap();

        let NetworkCommand::Subscribe { sender, .. } = commands.try_recv().unwrap() else {
            panic!("expected subscribe command");
        };
        sender.try_send(ChatMessage::new("alice", "hi")).unwrap();
        assert_eq!(subscription.try_recv(), Some(ChatMessage::new("alice", "hi")));
        assert_eq!(subscription.try_recv(), None);
    }

    #[test]
    fn emit_after_task_exit_is_closed() {
        let (connection, commands) = connection(4);
        drop(commands);
        assert!(matches!(
            connection.emit(OutgoingMessage::new("hello")),
            Err(ClientError::Closed)
        ));
    }

    #[test]
    fn emit_on_full_queue_is_busy() {
        let (connection, _commands) = connection(1);
        connection.emit(OutgoingMessage::new("first")).unwrap();
        assert!(matches!(
            connection.emit(OutgoingMessage::new("second")),
            Err(ClientError::Busy)
        ));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (connection, mut commands) = connection(4);
        connection.disconnect();
        assert!(matches!(commands.try_recv(), Ok(NetworkCommand::Disconnect)));

        drop(commands);
        connection.disconnect();
    }
}
