pub mod openai;

pub use openai::{LlmProviderConfig, OpenAIMock, RecordedRequests};
