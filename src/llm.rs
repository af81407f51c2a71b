//! Text completion: the remote endpoint client and reply sanitizing.

pub mod completion;
pub mod sanitize;

pub use completion::{CompletionClient, CompletionRequest, CompletionResponse};
pub use sanitize::sanitize;

use std::future::Future;

/// Anything that can turn a prompt into reply text.
///
/// Implementations never fail: every error path resolves to a user-facing
/// fallback string.
pub trait Completer: Send + Sync + 'static {
    fn complete(&self, prompt: &str) -> impl Future<Output = String> + Send;
}
