use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use crate::common::{ClientError, NetworkEvent, OutgoingMessage};
use crate::network::ChatConnection;

/// Line mode: every stdin line is sent as-is, inbound messages go to stdout.
/// Status goes to stderr so stdout stays a clean transcript.
pub async fn run(mut connection: ChatConnection, network: JoinHandle<()>) -> Result<(), ClientError> {
    let mut subscription = connection.subscribe()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut subscribed = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        if let Err(err) = connection.emit(OutgoingMessage::new(line)) {
                            log::warn!("Failed to send message: {err}");
                        }
                    }
                    None => {
                        stdin_open = false;
                        connection.disconnect();
                    }
                }
            }
            message = subscription.recv(), if subscribed => {
                match message {
                    Some(message) => println!("{}", message.display_text()),
                    None => subscribed = false,
                }
            }
            event = connection.next_event() => {
                match event {
                    Some(NetworkEvent::Connected { sid }) => eprintln!("connected ({sid})"),
                    Some(NetworkEvent::ProtocolError(message)) => eprintln!("warning: {message}"),
                    Some(NetworkEvent::Disconnected { reason }) => {
                        eprintln!("disconnected: {reason}");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if let Err(err) = network.await {
        log::error!("Network task panicked: {err}");
    }
    Ok(())
}
