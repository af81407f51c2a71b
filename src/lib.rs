//! cobiebot: a persona-driven Discord relay that answers mentions through a
//! text-completion endpoint and periodically posts to X.

pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod messaging;
pub mod prompts;
pub mod publisher;
pub mod relay;
pub mod social;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// Inbound message from the chat gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub source: String,
    /// Platform channel the reply goes back to.
    pub channel_id: String,
    pub author_id: String,
    /// Authored by the bot's own account.
    pub from_self: bool,
    /// The bot's user was explicitly mentioned.
    pub mentions_bot: bool,
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
