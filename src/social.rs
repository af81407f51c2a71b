//! Social feed publishing.

pub mod twitter;

pub use twitter::TwitterClient;

use crate::error::Result;
use std::future::Future;

/// A feed that accepts short text posts.
pub trait SocialFeed: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Publish `text` verbatim.
    fn publish(&self, text: &str) -> impl Future<Output = Result<()>> + Send;
}
