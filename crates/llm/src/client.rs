use std::sync::Arc;

use config::LlmConfig;
use futures::{StreamExt, TryStreamExt};

use crate::{
    error::{ConfigurationError, UpstreamError},
    messages::{ChatMessage, CompletionOptions, CompletionRequest},
    provider::{FragmentStream, Provider, openai::OpenAIProvider, token},
};

/// Entry point for talking to the upstream language model.
///
/// Holds no per-request state, so one instance can be shared behind an `Arc` by all
/// concurrent requests.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    default_options: CompletionOptions,
}

impl CompletionClient {
    /// Build a client for the OpenAI API from configuration.
    ///
    /// The API key comes from `[llm] api_key`, or else from the `OPENAI_API_KEY`
    /// environment variable.
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigurationError> {
        let api_key = token::resolve(config.api_key.as_ref(), |name| std::env::var(name).ok())?;
        let provider = OpenAIProvider::new(config, api_key)?;

        log::debug!(
            "Completion client ready, default model {} at temperature {}",
            config.model,
            config.temperature
        );

        Ok(Self::with_provider(provider, CompletionOptions::from(config)))
    }

    /// Build a client on top of any provider implementation.
    pub fn with_provider(provider: impl Provider + 'static, default_options: CompletionOptions) -> Self {
        Self {
            provider: Arc::new(provider),
            default_options,
        }
    }

    /// Options used when a caller does not bring its own.
    pub fn default_options(&self) -> &CompletionOptions {
        &self.default_options
    }

    /// Send a single user prompt and return the full reply.
    pub async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<String, UpstreamError> {
        self.complete_with_context(vec![ChatMessage::user(prompt)], options).await
    }

    /// Send a whole conversation, in order, and return the full reply.
    pub async fn complete_with_context(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String, UpstreamError> {
        let request = CompletionRequest { messages, options };

        self.provider.chat_completion(request).await.inspect_err(|e| {
            log::warn!("Completion via {} failed ({}): {e}", self.provider.name(), e.kind());
        })
    }

    /// Stream the reply to a single user prompt.
    ///
    /// The returned stream is lazy: the upstream request is only sent once it is first
    /// polled. A failure to connect arrives as its first item.
    pub fn complete_stream(&self, prompt: &str, options: CompletionOptions) -> FragmentStream {
        let provider = Arc::clone(&self.provider);

        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompt)],
            options,
        };

        futures::stream::once(async move { provider.chat_completion_stream(request).await })
            .try_flatten()
            .boxed()
    }
}
