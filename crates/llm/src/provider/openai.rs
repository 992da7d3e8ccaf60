mod input;
mod output;

use std::time::Duration;

use async_trait::async_trait;
use config::LlmConfig;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use self::{
    input::OpenAIRequest,
    output::{OpenAIResponse, StreamEvent},
};

use crate::{
    error::{ConfigurationError, UpstreamError},
    messages::CompletionRequest,
    provider::{FragmentStream, Provider},
};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

pub(crate) struct OpenAIProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl OpenAIProvider {
    pub fn new(config: &LlmConfig, api_key: SecretString) -> Result<Self, ConfigurationError> {
        // The total timeout is set per request, streams may legitimately run longer.
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| {
                log::error!("Failed to create HTTP client for OpenAI provider: {e}");
                ConfigurationError::HttpClient(e.to_string())
            })?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_API_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
            timeout: config.timeout,
        })
    }

    fn post(&self, body: &OpenAIRequest) -> RequestBuilder {
        let url = format!("{}/chat/completions", self.base_url);

        self.client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
            .json(body)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, UpstreamError> {
        let body = OpenAIRequest::new(request, false);
        log::debug!("Sending completion request for model {} with {} messages", body.model, body.messages.len());

        let response = self
            .post(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::Connection(format!("Failed to send request to OpenAI: {e}")))?;

        let response = check_status(response).await?;

        // First get the response as text to log if parsing fails
        let response_text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Connection(format!("Failed to read OpenAI response body: {e}")))?;

        let openai_response: OpenAIResponse = sonic_rs::from_str(&response_text).map_err(|e| {
            log::error!("Failed to parse OpenAI chat completion response: {e}");
            log::debug!("Raw response that failed to parse: {response_text}");
            UpstreamError::Decode(e.to_string())
        })?;

        openai_response.into_text()
    }

    async fn chat_completion_stream(&self, request: CompletionRequest) -> Result<FragmentStream, UpstreamError> {
        let body = OpenAIRequest::new(request, true);
        log::debug!("Opening completion stream for model {}", body.model);

        let response =
            self.post(&body).send().await.map_err(|e| {
                UpstreamError::Connection(format!("Failed to send streaming request to OpenAI: {e}"))
            })?;

        // Check for HTTP errors before attempting to stream
        let response = check_status(response).await?;

        let events = Box::pin(response.bytes_stream().eventsource());

        // Ends after [DONE], the end of the body, or the first failure.
        let fragments = futures::stream::unfold(Some(events), |events| async move {
            let mut events = events?;

            loop {
                let event = match events.next().await? {
                    Ok(event) => event,
                    Err(e) => {
                        log::warn!("OpenAI stream broke off: {e}");
                        return Some((Err(UpstreamError::Stream(e.to_string())), None));
                    }
                };

                match output::parse_stream_event(&event.data) {
                    Ok(StreamEvent::Fragment(fragment)) => return Some((Ok(fragment), Some(events))),
                    Ok(StreamEvent::Empty) => continue,
                    Ok(StreamEvent::Done) => return None,
                    Err(e) => {
                        log::warn!("OpenAI stream failed ({}): {e}", e.kind());
                        return Some((Err(e), None));
                    }
                }
            }
        });

        Ok(Box::pin(fragments))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Turn a non-success response into an error carrying the upstream's message.
async fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    log::error!("OpenAI API error ({status}): {error_text}");

    // Prefer the message from the standard error envelope over the raw body.
    let message = sonic_rs::from_str::<ErrorEnvelope>(&error_text)
        .map(|envelope| envelope.error.message)
        .unwrap_or(error_text);

    Err(UpstreamError::from_status(status.as_u16(), message))
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: output::OpenAIErrorBody,
}
