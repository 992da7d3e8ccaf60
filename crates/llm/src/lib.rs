//! Client for an OpenAI-compatible chat completion upstream.
//!
//! [`CompletionClient`] offers a single-shot completion, a completion over a caller
//! supplied conversation, and a streaming completion that yields text fragments as
//! the upstream produces them.

mod client;
mod error;
mod messages;
mod provider;

pub use client::CompletionClient;
pub use error::{ConfigurationError, UpstreamError};
pub use messages::{ChatMessage, CompletionOptions, CompletionRequest, Role};
pub use provider::{FragmentStream, Provider};
