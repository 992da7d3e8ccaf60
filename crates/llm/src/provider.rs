pub(crate) mod openai;
pub(crate) mod token;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{error::UpstreamError, messages::CompletionRequest};

/// Stream of incremental response text.
///
/// Each item is a non-empty fragment of assistant output in arrival order. An `Err`
/// item marks the point where the upstream failed, no fragment follows it.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// An upstream chat completion service.
///
/// Note for async_trait: the client holds providers as trait objects, so the trait
/// has to stay dyn-compatible.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the conversation and wait for the complete assistant reply.
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, UpstreamError>;

    /// Open a streaming completion.
    ///
    /// Resolves once the upstream accepted the request. Failures after that point are
    /// reported as items of the returned stream.
    async fn chat_completion_stream(&self, request: CompletionRequest) -> Result<FragmentStream, UpstreamError>;

    /// Provider name, for logging.
    fn name(&self) -> &str;
}
