use thiserror::Error;

/// The completion client could not be constructed.
///
/// These are fatal for the client instance and never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No API key was given explicitly and none was found in the environment.
    #[error("An API key is required. Set the OPENAI_API_KEY environment variable or configure [llm] api_key.")]
    MissingApiKey,

    /// The HTTP client backing the provider failed to build.
    #[error("Failed to create the HTTP client: {0}")]
    HttpClient(String),
}

/// Communication with the upstream language model failed.
///
/// The variants keep the failure kind apart for logging, the display text is what a
/// user ends up seeing in the page output.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request could not be sent or the connection was lost before a response arrived.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The upstream rejected the API key.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The upstream throttled the request or the account ran out of quota.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The upstream answered with any other error status.
    #[error("Upstream API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The upstream response could not be decoded.
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    /// The response stream broke off or reported an error after it started.
    #[error("Stream interrupted: {0}")]
    Stream(String),

    /// A completion response carried no choices.
    #[error("Upstream response contained no choices")]
    NoChoices,
}

impl UpstreamError {
    /// Stable tag for the kind of failure, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_error",
            Self::Authentication(_) => "authentication_error",
            Self::RateLimited(_) => "rate_limit_error",
            Self::Api { .. } => "api_error",
            Self::Decode(_) => "decode_error",
            Self::Stream(_) => "stream_error",
            Self::NoChoices => "no_choices",
        }
    }

    /// Map a non-success upstream status and its body to an error.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Authentication(message),
            429 => Self::RateLimited(message),
            _ => Self::Api { status, message },
        }
    }
}
