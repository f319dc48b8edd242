pub mod client;
pub mod connection;
pub mod packet;
pub mod transport;

pub use client::SocketClient;
pub use connection::{ChatConnection, Subscription};
pub use transport::ConnectOptions;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 100;

/// Start the network task and hand back the connection that controls it.
pub fn spawn(options: ConnectOptions) -> (ChatConnection, JoinHandle<()>) {
    // UI -> Network
    let (command_sender, command_receiver) = mpsc::channel(CHANNEL_CAPACITY);
    // Network -> UI
    let (event_sender, event_receiver) = mpsc::channel(CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        let client = SocketClient::new(options, event_sender, command_receiver);
        if let Err(err) = client.run().await {
            log::error!("Network client terminated: {err}");
        }
    });

    (ChatConnection::new(command_sender, event_receiver), task)
}
