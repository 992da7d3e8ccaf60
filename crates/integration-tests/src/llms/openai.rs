use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Json, Response},
    routing::post,
};
use futures::{StreamExt, stream::BoxStream};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Builder for a server that mimics the OpenAI Chat Completions API.
///
/// Answers every request with the configured fragments: one SSE event per fragment
/// when streaming, their concatenation otherwise.
pub struct OpenAIMock {
    fragments: Vec<String>,
    null_content: bool,
    stream_failure: Option<StreamFailure>,
    error: Option<(StatusCode, String)>,
    requests: RecordedRequests,
}

#[derive(Clone)]
enum StreamFailure {
    /// Send an error event after this many fragments.
    InBand { after: usize, message: String },
    /// Break the connection after this many fragments.
    Abort { after: usize },
}

/// Every request body the mock received, in arrival order.
#[derive(Clone, Default)]
pub struct RecordedRequests(Arc<Mutex<Vec<Value>>>);

impl RecordedRequests {
    pub fn all(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recent request body.
    pub fn last(&self) -> Value {
        self.0.lock().unwrap().last().cloned().expect("no request was recorded")
    }

    fn push(&self, request: Value) {
        self.0.lock().unwrap().push(request);
    }
}

impl Default for OpenAIMock {
    fn default() -> Self {
        Self {
            fragments: vec!["Hel".to_string(), "lo!".to_string()],
            null_content: false,
            stream_failure: None,
            error: None,
            requests: RecordedRequests::default(),
        }
    }
}

impl OpenAIMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    /// Answer non-streaming requests with `"content": null`.
    pub fn with_null_content(mut self) -> Self {
        self.null_content = true;
        self
    }

    pub fn with_stream_error_after(mut self, after: usize, message: impl Into<String>) -> Self {
        self.stream_failure = Some(StreamFailure::InBand {
            after,
            message: message.into(),
        });
        self
    }

    pub fn with_abort_after(mut self, after: usize) -> Self {
        self.stream_failure = Some(StreamFailure::Abort { after });
        self
    }

    pub fn with_auth_error(self, message: impl Into<String>) -> Self {
        self.with_error(StatusCode::UNAUTHORIZED, message)
    }

    pub fn with_rate_limit(self, message: impl Into<String>) -> Self {
        self.with_error(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn with_internal_error(self, message: impl Into<String>) -> Self {
        self.with_error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    fn with_error(mut self, status: StatusCode, message: impl Into<String>) -> Self {
        self.error = Some((status, message.into()));
        self
    }

    /// Handle to the requests this mock will receive once spawned.
    pub fn requests(&self) -> RecordedRequests {
        self.requests.clone()
    }

    /// Start the mock server and return where to reach it.
    pub async fn spawn(self) -> anyhow::Result<LlmProviderConfig> {
        let requests = self.requests.clone();

        let state = Arc::new(MockState {
            fragments: self.fragments,
            null_content: self.null_content,
            stream_failure: self.stream_failure,
            error: self.error,
            requests: self.requests,
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(LlmProviderConfig { address, requests })
    }
}

/// A running mock upstream.
pub struct LlmProviderConfig {
    pub address: SocketAddr,
    pub requests: RecordedRequests,
}

impl LlmProviderConfig {
    /// Value for `[llm] base_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.address)
    }
}

struct MockState {
    fragments: Vec<String>,
    null_content: bool,
    stream_failure: Option<StreamFailure>,
    error: Option<(StatusCode, String)>,
    requests: RecordedRequests,
}

async fn chat_completions(State(state): State<Arc<MockState>>, Json(request): Json<Value>) -> Response {
    let streaming = request["stream"].as_bool().unwrap_or(false);
    let model = request["model"].as_str().unwrap_or_default().to_string();

    state.requests.push(request);

    if let Some((status, message)) = &state.error {
        let body = json!({
            "error": {
                "message": message,
                "type": "invalid_request_error",
            }
        });

        return (*status, Json(body)).into_response();
    }

    if streaming {
        stream_response(&state, &model)
    } else {
        Json(completion_response(&state, &model)).into_response()
    }
}

fn completion_response(state: &MockState, model: &str) -> Value {
    let content = if state.null_content {
        Value::Null
    } else {
        Value::String(state.fragments.concat())
    };

    json!({
        "id": format!("chatcmpl-test-{}", uuid::Uuid::new_v4()),
        "object": "chat.completion",
        "created": 1677651200,
        "model": model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 15,
            "total_tokens": 25,
        },
    })
}

fn stream_response(state: &MockState, model: &str) -> Response {
    let id = format!("chatcmpl-test-{}", uuid::Uuid::new_v4());

    let chunk = |delta: Value, finish_reason: Option<&str>| {
        let data = json!({
            "id": id,
            "object": "chat.completion.chunk",
            "created": 1677651200,
            "model": model,
            "choices": [{ "index": 0, "delta": delta, "finish_reason": finish_reason }],
        });

        event(&data.to_string())
    };

    let mut events = vec![chunk(json!({ "role": "assistant" }), None)];

    for (i, fragment) in state.fragments.iter().enumerate() {
        match &state.stream_failure {
            Some(StreamFailure::InBand { after, message }) if *after == i => {
                let error = json!({ "error": { "message": message, "type": "server_error" } });
                events.push(event(&error.to_string()));

                return sse(futures::stream::iter(events).map(Ok).boxed());
            }
            Some(StreamFailure::Abort { after }) if *after == i => {
                // Pause so the events already sent get flushed before the connection breaks.
                let abort = futures::stream::once(async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err(std::io::Error::other("connection dropped by mock"))
                });

                return sse(futures::stream::iter(events).map(Ok).chain(abort).boxed());
            }
            _ => events.push(chunk(json!({ "content": fragment }), None)),
        }
    }

    events.push(chunk(json!({}), Some("stop")));
    events.push(event("[DONE]"));

    sse(futures::stream::iter(events).map(Ok).boxed())
}

fn event(data: &str) -> Bytes {
    Bytes::from(format!("data: {data}\n\n"))
}

fn sse(events: BoxStream<'static, Result<Bytes, std::io::Error>>) -> Response {
    let body = Body::from_stream(events);

    ([(CONTENT_TYPE, "text/event-stream")], body).into_response()
}
