//! Chat relay: decide whether to answer, compose the prompt, complete it and
//! send the reply back to the originating channel.
//!
//! Every inbound message is handled on its own task. Replies to messages that
//! arrive close together may go out in either order.

use crate::InboundMessage;
use crate::error::Result;
use crate::llm::Completer;
use crate::llm::completion::TRANSPORT_REPLY;
use crate::messaging::{InboundStream, MessagingDyn};
use crate::prompts::PromptComposer;

use futures::StreamExt as _;
use std::sync::Arc;

/// What the relay did with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Authored by the bot itself.
    OwnMessage,
    /// Neither named nor mentioned the persona.
    Ignored,
    Replied,
}

/// True when `text` contains `name_token` anywhere (case-sensitive, no word
/// boundaries) or the bot was mentioned directly.
pub fn should_respond(text: &str, mentions_bot: bool, name_token: &str) -> bool {
    let respond = text.contains(name_token) || mentions_bot;
    if respond {
        tracing::debug!(mentions_bot, "persona mentioned, responding");
    } else {
        tracing::debug!("no mention of persona, ignoring");
    }
    respond
}

pub struct ChatRelay<C> {
    persona_name: String,
    composer: PromptComposer,
    completer: C,
    messaging: Arc<dyn MessagingDyn>,
}

impl<C> std::fmt::Debug for ChatRelay<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRelay")
            .field("persona_name", &self.persona_name)
            .field("adapter", &self.messaging.name())
            .finish_non_exhaustive()
    }
}

impl<C: Completer> ChatRelay<C> {
    pub fn new(
        persona_name: impl Into<String>,
        composer: PromptComposer,
        completer: C,
        messaging: Arc<dyn MessagingDyn>,
    ) -> Self {
        Self {
            persona_name: persona_name.into(),
            composer,
            completer,
            messaging,
        }
    }

    /// Consume the inbound stream, spawning one task per message. Returns
    /// when the stream ends.
    pub async fn run(self: Arc<Self>, mut inbound: InboundStream) {
        while let Some(message) = inbound.next().await {
            let relay = self.clone();
            tokio::spawn(async move {
                let message_id = message.id.clone();
                if let Err(error) = relay.handle(message).await {
                    tracing::error!(%message_id, %error, "failed to handle message");
                }
            });
        }

        tracing::info!(adapter = self.messaging.name(), "inbound stream ended");
    }

    /// Handle one inbound message. Sends at most one reply.
    pub async fn handle(&self, message: InboundMessage) -> Result<Disposition> {
        if message.from_self {
            return Ok(Disposition::OwnMessage);
        }

        tracing::info!(
            channel_id = %message.channel_id,
            author_id = %message.author_id,
            text = %message.text,
            "received message"
        );

        if !should_respond(&message.text, message.mentions_bot, &self.persona_name) {
            return Ok(Disposition::Ignored);
        }

        let reply = match self.composer.compose(&message.text) {
            Ok(prompt) => self.completer.complete(&prompt).await,
            Err(error) => {
                tracing::error!(%error, "failed to compose prompt");
                TRANSPORT_REPLY.to_string()
            }
        };

        // Discord refuses empty messages; a reply that was all emoji ends up here.
        let reply = if reply.trim().is_empty() {
            tracing::warn!(message_id = %message.id, "completion was empty after sanitizing");
            TRANSPORT_REPLY.to_string()
        } else {
            reply
        };

        self.messaging.respond(&message, &reply).await?;

        tracing::info!(
            channel_id = %message.channel_id,
            reply = %reply,
            "reply sent"
        );

        Ok(Disposition::Replied)
    }
}
