use integration_tests::{TestServer, llms::OpenAIMock};
use serde_json::json;

const STREAM_PAGES: [&str; 5] = ["first", "clarity", "format", "direction", "labor"];

#[tokio::test]
async fn say_hi() {
    let mock = OpenAIMock::new().with_fragments(["Hel", "lo!"]);
    let requests = mock.requests();

    let mut builder = TestServer::builder();
    builder.spawn_llm(mock).await;
    let server = builder.build("").await;

    let response = server.client.post_form("/first/stream", &[("prompt", "Say hi")]).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(response.text().await.unwrap(), "Hello!");

    let request = requests.last();
    assert_eq!(request["stream"], json!(true));
    assert_eq!(request["model"], json!("gpt-4o-mini"));
    assert_eq!(request["temperature"], json!(0.7));
    assert_eq!(request["messages"], json!([{ "role": "user", "content": "Say hi" }]));
}

#[tokio::test]
async fn every_stream_page() {
    let mut builder = TestServer::builder();
    builder.spawn_llm(OpenAIMock::new().with_fragments(["A", "B", "C"])).await;
    let server = builder.build("").await;

    for page in STREAM_PAGES {
        let body = server.client.prompt(&format!("/{page}/stream"), "letters").await;
        assert_eq!(body, "ABC", "{page}");
    }
}

#[tokio::test]
async fn configured_model_is_used() {
    let config = indoc::indoc! {r#"
        [llm]
        model = "gpt-4o"
        temperature = 0.0
        max_tokens = 256
    "#};

    let mock = OpenAIMock::new();
    let requests = mock.requests();

    let mut builder = TestServer::builder();
    builder.spawn_llm(mock).await;
    let server = builder.build(config).await;

    server.client.prompt("/direction/stream", "Say hi").await;

    let request = requests.last();
    assert_eq!(request["model"], json!("gpt-4o"));
    assert_eq!(request["temperature"], json!(0.0));
    assert_eq!(request["max_tokens"], json!(256));
}

#[tokio::test]
async fn blank_prompt_never_reaches_the_upstream() {
    let mock = OpenAIMock::new();
    let requests = mock.requests();

    let mut builder = TestServer::builder();
    builder.spawn_llm(mock).await;
    let server = builder.build("").await;

    for prompt in ["", "   ", "\n\t"] {
        let body = server.client.prompt("/clarity/stream", prompt).await;
        assert_eq!(body, "Error: No API client or empty prompt", "{prompt:?}");
    }

    assert!(requests.is_empty());
}

#[tokio::test]
async fn missing_prompt_field() {
    let mut builder = TestServer::builder();
    builder.spawn_llm(OpenAIMock::new()).await;
    let server = builder.build("").await;

    let response = server.client.post_form("/first/stream", &[("other", "x")]).await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn upstream_rejects_the_key() {
    let mut builder = TestServer::builder();
    builder
        .spawn_llm(OpenAIMock::new().with_auth_error("Incorrect API key provided"))
        .await;
    let server = builder.build("").await;

    let body = server.client.prompt("/labor/stream", "Say hi").await;

    insta::assert_snapshot!(body, @"Error: Authentication failed: Incorrect API key provided");
}

#[tokio::test]
async fn error_event_after_fragments() {
    let mut builder = TestServer::builder();
    builder
        .spawn_llm(
            OpenAIMock::new()
                .with_fragments(["one ", "two ", "three"])
                .with_stream_error_after(2, "upstream overloaded"),
        )
        .await;
    let server = builder.build("").await;

    let body = server.client.prompt("/format/stream", "count").await;

    insta::assert_snapshot!(body, @"one two Error: Stream interrupted: upstream overloaded");
}

#[tokio::test]
async fn connection_lost_after_fragments() {
    let mut builder = TestServer::builder();
    builder
        .spawn_llm(OpenAIMock::new().with_fragments(["one ", "two ", "three"]).with_abort_after(1))
        .await;
    let server = builder.build("").await;

    let body = server.client.prompt("/format/stream", "count").await;

    assert!(body.starts_with("one Error: Stream interrupted: "), "{body}");
    assert!(!body.contains("two"), "{body}");
}

#[tokio::test]
async fn repeated_prompts_are_not_cached() {
    let mock = OpenAIMock::new();
    let requests = mock.requests();

    let mut builder = TestServer::builder();
    builder.spawn_llm(mock).await;
    let server = builder.build("").await;

    for _ in 0..2 {
        assert_eq!(server.client.prompt("/first/stream", "Say hi").await, "Hello!");
    }

    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn concurrent_prompts() {
    let mock = OpenAIMock::new();
    let requests = mock.requests();

    let mut builder = TestServer::builder();
    builder.spawn_llm(mock).await;
    let server = builder.build("").await;

    let replies = futures::future::join_all(STREAM_PAGES.map(|page| {
        let path = format!("/{page}/stream");
        let client = &server.client;

        async move { client.prompt(&path, "Say hi").await }
    }))
    .await;

    assert!(replies.iter().all(|reply| reply == "Hello!"), "{replies:?}");
    assert_eq!(requests.len(), STREAM_PAGES.len());
}

#[tokio::test]
async fn pages_without_stream_route() {
    let mut builder = TestServer::builder();
    builder.spawn_llm(OpenAIMock::new()).await;
    let server = builder.build("").await;

    for path in ["/examples/stream", "/end/stream", "/options/stream"] {
        let response = server.client.post_form(path, &[("prompt", "Say hi")]).await;
        assert_eq!(response.status(), 404, "{path}");
    }
}
