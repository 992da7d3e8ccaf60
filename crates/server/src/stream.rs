use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::{Form, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};
use llm::FragmentStream;
use serde::Deserialize;

use crate::{AppState, page::Page};

/// Reply when the request cannot be served at all.
pub(crate) const PRECONDITION_FAILED: &str = "Error: No API client or empty prompt";

#[derive(Debug, Deserialize)]
pub(crate) struct PromptForm {
    prompt: String,
}

/// Stream the completion of a submitted prompt back as plain text.
///
/// Errors are reported in the body, never through the status code: a request that
/// cannot start gets a single error chunk, and a stream that fails midway ends with one.
pub(crate) async fn stream_prompt(page: Page, State(state): State<AppState>, Form(form): Form<PromptForm>) -> Response {
    let Some(client) = state.client.as_ref().filter(|_| !form.prompt.trim().is_empty()) else {
        log::debug!(
            "Rejecting {page} prompt: client configured={}, prompt empty={}",
            state.client.is_some(),
            form.prompt.trim().is_empty()
        );

        return plain_text(Body::from(PRECONDITION_FAILED));
    };

    log::debug!("Streaming {page} prompt of {} bytes", form.prompt.len());

    let fragments = client.complete_stream(&form.prompt, client.default_options().clone());

    plain_text(Body::from_stream(relay(fragments)))
}

/// Forward fragments as body chunks until the upstream ends or fails.
///
/// A failure becomes one final `Error: {description}` chunk. Dropping the returned
/// stream drops the upstream stream with it.
pub(crate) fn relay(fragments: FragmentStream) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    futures::stream::unfold(Some(fragments), |fragments| async move {
        let mut fragments = fragments?;

        match fragments.next().await? {
            Ok(fragment) => Some((Ok(Bytes::from(fragment)), Some(fragments))),
            Err(e) => {
                log::warn!("Prompt stream failed ({}): {e}", e.kind());
                Some((Ok(Bytes::from(format!("Error: {e}"))), None))
            }
        }
    })
}

fn plain_text(body: Body) -> Response {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}
