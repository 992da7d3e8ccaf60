use serde::Serialize;

use crate::messages::{ChatMessage, CompletionRequest};

/// Request body for the Chat Completions API.
///
/// Mirrors the subset of `/v1/chat/completions` this service uses, see the
/// [OpenAI API Reference](https://platform.openai.com/docs/api-reference/chat/create).
#[derive(Debug, Serialize)]
pub(super) struct OpenAIRequest {
    /// ID of the model to use.
    pub(super) model: String,

    /// The conversation so far, in order.
    pub(super) messages: Vec<ChatMessage>,

    /// Sampling temperature, between 0 and 2.
    pub(super) temperature: f32,

    /// The maximum number of tokens that can be generated in the completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) max_tokens: Option<u32>,

    /// If set, partial message deltas are sent as data-only server-sent events,
    /// terminated by a `data: [DONE]` message.
    pub(super) stream: bool,
}

impl OpenAIRequest {
    pub(super) fn new(request: CompletionRequest, stream: bool) -> Self {
        let CompletionRequest { messages, options } = request;

        Self {
            model: options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream,
        }
    }
}
