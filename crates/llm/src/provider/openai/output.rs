use std::borrow::Cow;

use serde::Deserialize;

use crate::error::UpstreamError;

/// Response from the Chat Completions API, reduced to what we read.
#[derive(Debug, Deserialize)]
pub(super) struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIChoice {
    pub message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIMessage {
    /// Null for refusals and tool calls.
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAIResponse {
    /// Text of the first choice.
    pub(super) fn into_text(self) -> Result<String, UpstreamError> {
        let choice = self.choices.into_iter().next().ok_or(UpstreamError::NoChoices)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

/// One server-sent event of a streaming completion.
///
/// Providers occasionally report failures in-band after the stream has started,
/// in which case `error` is set and `choices` is absent.
#[derive(Debug, Deserialize)]
pub(super) struct OpenAIStreamChunk<'a> {
    #[serde(default, borrow)]
    pub choices: Vec<OpenAIStreamChoice<'a>>,
    #[serde(default)]
    pub error: Option<OpenAIErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIStreamChoice<'a> {
    #[serde(borrow)]
    pub delta: OpenAIDelta<'a>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIDelta<'a> {
    #[serde(default, borrow)]
    pub content: Option<Cow<'a, str>>,
}

/// Error object as returned in error responses and in-band stream errors.
#[derive(Debug, Deserialize)]
pub(super) struct OpenAIErrorBody {
    pub message: String,
}

/// What a single stream event means for the fragment stream.
#[derive(Debug, PartialEq)]
pub(super) enum StreamEvent {
    Fragment(String),
    Empty,
    Done,
}

/// Interpret the data of one server-sent event.
pub(super) fn parse_stream_event(data: &str) -> Result<StreamEvent, UpstreamError> {
    if data.trim() == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let chunk: OpenAIStreamChunk<'_> =
        sonic_rs::from_str(data).map_err(|e| UpstreamError::Decode(format!("invalid stream chunk: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(UpstreamError::Stream(error.message));
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());

    Ok(match content {
        Some(content) => StreamEvent::Fragment(content.into_owned()),
        None => StreamEvent::Empty,
    })
}
