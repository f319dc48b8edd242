use crate::common::{ChatMessage, OutgoingMessage};
use crate::network::{ChatConnection, Subscription};

use super::state::AppState;

/// The chat widget: message log, input field and the connection feeding them.
///
/// Everything here runs on the UI thread; the network task only reaches it
/// through the subscription and status channels drained by [`ChatWidget::pump`].
pub struct ChatWidget {
    state: AppState,
    connection: ChatConnection,
    subscription: Option<Subscription>,
}

impl ChatWidget {
    pub fn new(connection: ChatConnection) -> Self {
        Self {
            state: AppState::new(),
            connection,
            subscription: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn mount(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        match self.connection.subscribe() {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(err) => {
                log::warn!("Failed to subscribe to chat messages: {err}");
                self.state
                    .add_status_event("SUBSCRIBE_FAILED".to_string(), err.to_string());
            }
        }
    }

    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            if let Err(err) = self.connection.unsubscribe(subscription.id()) {
                log::debug!("Unsubscribe not delivered: {err}");
            }
        }
        self.connection.disconnect();
    }

    /// Drain status events and inbound messages queued since the last frame.
    pub fn pump(&mut self) {
        while let Some(event) = self.connection.try_next_event() {
            self.state.apply_network_event(event);
        }

        let mut inbound = Vec::new();
        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(message) = subscription.try_recv() {
                inbound.push(message);
            }
        }
        for message in inbound {
            self.on_message(message);
        }
    }

    pub fn on_message(&mut self, message: ChatMessage) {
        self.state.push_message(message);
        self.scroll_to_bottom();
    }

    /// Emit the input text exactly as typed, then clear the field.
    pub fn send(&mut self) {
        let content = self.state.input_text.clone();
        if let Err(err) = self.connection.emit(OutgoingMessage::new(content)) {
            log::warn!("Failed to send message: {err}");
            self.state
                .add_status_event("SEND_FAILED".to_string(), err.to_string());
        }
        self.state.input_text.clear();
        self.scroll_to_bottom();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.state.scroll.scroll_to_bottom();
    }
}

impl Drop for ChatWidget {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::common::{NetworkCommand, NetworkEvent};
    use crate::ui::state::ConnectionStatus;

    struct Harness {
        widget: ChatWidget,
        commands: mpsc::Receiver<NetworkCommand>,
        events: mpsc::Sender<NetworkEvent>,
    }

    fn harness() -> Harness {
        let (command_sender, commands) = mpsc::channel(16);
        let (events, event_receiver) = mpsc::channel(16);
        Harness {
            widget: ChatWidget::new(ChatConnection::new(command_sender, event_receiver)),
            commands,
            events,
        }
    }

    fn mounted() -> (Harness, mpsc::Sender<ChatMessage>) {
        let mut harness = harness();
        harness.widget.mount();
        let NetworkCommand::Subscribe { sender, .. } = harness.commands.try_recv().unwrap() else {
            panic!("mount should subscribe");
        };
        (harness, sender)
    }

    fn sent_contents(commands: &mut mpsc::Receiver<NetworkCommand>) -> Vec<String> {
        let mut contents = Vec::new();
        while let Ok(command) = commands.try_recv() {
            if let NetworkCommand::Emit(message) = command {
                contents.push(message.content);
            }
        }
        contents
    }

    #[test]
    fn received_message_becomes_last_log_line() {
        let (mut harness, inbound) = mounted();
        harness
            .widget
            .on_message(ChatMessage::new("bob", "earlier"));

        inbound.try_send(ChatMessage::new("alice", "hi")).unwrap();
        harness.widget.pump();

        let messages = &harness.widget.state().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages.last().unwrap().display_text(), "alice: hi");
    }

    #[test]
    fn receiving_scrolls_to_bottom() {
        let (mut harness, _inbound) = mounted();
        harness
            .widget
            .state_mut()
            .scroll
            .update_from_view(0.0, 800.0, 300.0);

        harness.widget.on_message(ChatMessage::new("alice", "hi"));

        let scroll = &mut harness.widget.state_mut().scroll;
        assert_eq!(scroll.offset, 500.0);
        assert!(scroll.take_jump());
    }

    #[test]
    fn markup_in_content_is_kept_as_text() {
        let (mut harness, _inbound) = mounted();
        let content = "<img src=x onerror=alert(1)> & <b>bold</b>";
        harness.widget.on_message(ChatMessage::new("mallory", content));

        let line = harness.widget.state().messages.last().unwrap();
        assert_eq!(line.content, content);
        assert_eq!(line.display_text(), format!("mallory: {content}"));
    }

    #[test]
    fn send_emits_once_and_clears_input() {
        let (mut harness, _inbound) = mounted();
        harness.widget.state_mut().input_text = "hello".to_string();

        harness.widget.send();

        assert_eq!(sent_contents(&mut harness.commands), vec!["hello".to_string()]);
        assert_eq!(harness.widget.state().input_text, "");
    }

    #[test]
    fn send_does_not_trim_or_skip_any_input() {
        let (mut harness, _inbound) = mounted();
        let inputs = ["", " ", "  padded  ", "tab\tand\nnewline", "<b>x</b>", "日本語"];

        for input in inputs {
            harness.widget.state_mut().input_text = input.to_string();
            harness.widget.send();
        }

        assert_eq!(sent_contents(&mut harness.commands), inputs.to_vec());
    }

    #[test]
    fn failed_send_still_clears_and_is_reported() {
        let (mut harness, _inbound) = mounted();
        harness.commands.close();
        harness.widget.state_mut().input_text = "lost".to_string();

        harness.widget.send();

        let state = harness.widget.state();
        assert_eq!(state.input_text, "");
        assert_eq!(state.status_events.last().unwrap().event_type, "SEND_FAILED");
    }

    #[test]
    fn pump_applies_status_events() {
        let (mut harness, _inbound) = mounted();
        harness
            .events
            .try_send(NetworkEvent::Connected {
                sid: "sid-1".to_string(),
            })
            .unwrap();

        harness.widget.pump();

        assert_eq!(
            harness.widget.state().status,
            ConnectionStatus::Connected {
                sid: "sid-1".to_string()
            }
        );
    }

    #[test]
    fn mount_twice_subscribes_once() {
        let (mut harness, _inbound) = mounted();
        harness.widget.mount();
        assert!(harness.commands.try_recv().is_err());
    }

    #[test]
    fn dropping_the_widget_unsubscribes_and_disconnects() {
        let (harness, _inbound) = mounted();
        let Harness {
            widget,
            mut commands,
            ..
        } = harness;

        drop(widget);

        assert!(matches!(
            commands.try_recv(),
            Ok(NetworkCommand::Unsubscribe(_))
        ));
        assert!(matches!(commands.try_recv(), Ok(NetworkCommand::Disconnect)));
    }
}
