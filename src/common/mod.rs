pub mod commands;
pub mod error;
pub mod events;
pub mod types;

pub use commands::{NetworkCommand, SubscriptionId};
pub use error::ClientError;
pub use events::NetworkEvent;
pub use types::{ChatMessage, OutgoingMessage};
