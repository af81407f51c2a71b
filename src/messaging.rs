//! Chat gateway adapters.

pub mod discord;
pub mod traits;

pub use discord::DiscordAdapter;
pub use traits::{InboundStream, Messaging, MessagingDyn};
