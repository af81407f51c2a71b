//! Periodic publisher: posts a random completion example to the social feed
//! on a fixed interval.
//!
//! The first post goes out as soon as the publisher starts. Missed ticks are
//! skipped rather than replayed, and a failed post never stops the timer.

use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::social::SocialFeed;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub struct PeriodicPublisher<F> {
    knowledge: Arc<KnowledgeBase>,
    feed: Arc<F>,
    interval: Duration,
}

impl<F> std::fmt::Debug for PeriodicPublisher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicPublisher")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<F: SocialFeed> PeriodicPublisher<F> {
    pub fn new(knowledge: Arc<KnowledgeBase>, feed: Arc<F>, interval: Duration) -> Self {
        Self {
            knowledge,
            feed,
            interval,
        }
    }

    /// Spawn the timer loop. Abort the returned handle to stop it.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                feed = self.feed.name(),
                interval_secs = self.interval.as_secs(),
                "periodic publisher started"
            );

            loop {
                ticker.tick().await;

                if let Err(error) = self.tick().await {
                    tracing::error!(feed = self.feed.name(), %error, "failed to publish post");
                }
            }
        })
    }

    /// Publish one sample. Posts are sent as written in the knowledge base,
    /// without the emoji and `#`/`@` stripping applied to chat replies.
    pub async fn tick(&self) -> Result<String> {
        let text = self
            .knowledge
            .sample_completion_example(&mut rand::rng())
            .trim()
            .to_string();

        self.feed.publish(&text).await?;

        tracing::info!(feed = self.feed.name(), text = %text, "published post");
        Ok(text)
    }
}
