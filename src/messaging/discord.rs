//! Discord messaging adapter using serenity.

use crate::InboundMessage;
use crate::error::{MessagingError, Result};
use crate::messaging::traits::{InboundStream, Messaging};

use anyhow::Context as _;
use async_trait::async_trait;
use serenity::all::{ChannelId, Context, EventHandler, GatewayIntents, Message, Ready};

use serenity::gateway::ShardManager;
use serenity::http::Http;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Discord messages are limited to 2000 characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

/// Discord adapter state.
pub struct DiscordAdapter {
    token: String,
    http: Arc<RwLock<Option<Arc<Http>>>>,
    shard_manager: Arc<RwLock<Option<Arc<ShardManager>>>>,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: Arc::new(RwLock::new(None)),
            shard_manager: Arc::new(RwLock::new(None)),
        }
    }
}

/// Gateway event handler that forwards every message into the inbound stream.
struct Handler {
    inbound_tx: mpsc::Sender<InboundMessage>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord connected"
        );
    }

    async fn message(&self, ctx: Context, message: Message) {
        let bot_id = ctx.cache.current_user().id;

        let inbound = InboundMessage {
            id: message.id.to_string(),
            source: "discord".into(),
            channel_id: message.channel_id.to_string(),
            author_id: message.author.id.to_string(),
            from_self: message.author.id == bot_id,
            mentions_bot: message.mentions_user_id(bot_id),
            text: message.content.trim().to_string(),
            timestamp: chrono::Utc::now(),
        };

        if let Err(error) = self.inbound_tx.send(inbound).await {
            tracing::warn!(
                %error,
                "failed to forward discord message (receiver dropped)"
            );
        }
    }
}

impl Messaging for DiscordAdapter {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> Result<InboundStream> {
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let mut client = serenity::Client::builder(&self.token, intents)
            .event_handler(Handler { inbound_tx })
            .await
            .context("failed to build discord client")?;

        *self.http.write().await = Some(client.http.clone());
        *self.shard_manager.write().await = Some(client.shard_manager.clone());

        // The handler owns the only sender, so the inbound stream ends once
        // the client (and its handler) is dropped.
        tokio::spawn(async move {
            if let Err(error) = client.start().await {
                tracing::error!(%error, "discord gateway stopped");
            }
        });

        let stream = tokio_stream::wrappers::ReceiverStream::new(inbound_rx);
        Ok(Box::pin(stream))
    }

    async fn respond(&self, message: &InboundMessage, text: &str) -> Result<()> {
        let http = self
            .http
            .read()
            .await
            .clone()
            .ok_or_else(|| MessagingError::NotConnected {
                adapter: "discord".into(),
            })?;

        let channel_id = parse_channel_id(&message.channel_id)?;

        for chunk in split_message(text, MAX_MESSAGE_LENGTH) {
            channel_id
                .say(&http, chunk)
                .await
                .map_err(|error| MessagingError::SendFailed(error.to_string()))?;
        }

        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        if let Some(shard_manager) = self.shard_manager.write().await.take() {
            shard_manager.shutdown_all().await;
        }
        *self.http.write().await = None;

        tracing::info!("discord adapter shut down");
        Ok(())
    }
}

fn parse_channel_id(raw: &str) -> Result<ChannelId> {
    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Ok(ChannelId::new(id)),
        _ => Err(MessagingError::InvalidChannel(raw.to_string()).into()),
    }
}

/// Split a message into chunks that fit within Discord's character limit.
/// Tries to split at newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > max_chars {
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map(|(index, _)| index)
            .unwrap_or(remaining.len());
        let window = &remaining[..limit];

        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&index| index > 0)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_are_sent_whole() {
        assert_eq!(split_message("gm", 10), vec!["gm".to_string()]);
    }

    #[test]
    fn splits_at_spaces_within_the_limit() {
        let chunks = split_message("alpha bravo charlie delta", 12);

        assert_eq!(chunks, vec!["alpha bravo", "charlie", "delta"]);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 12));
    }

    #[test]
    fn prefers_newlines_over_spaces() {
        let chunks = split_message("one two\nthree four", 12);
        assert_eq!(chunks, vec!["one two", "three four"]);
    }

    #[test]
    fn hard_cuts_on_character_boundaries() {
        let text = "éééééééééé";
        let chunks = split_message(text, 4);

        assert_eq!(chunks, vec!["éééé", "éééé", "éé"]);
    }

    #[test]
    fn parses_snowflake_channel_ids() {
        assert_eq!(
            parse_channel_id("190291964875374603").expect("valid id"),
            ChannelId::new(190291964875374603)
        );
        assert!(parse_channel_id("general").is_err());
        assert!(parse_channel_id("0").is_err());
    }
}
