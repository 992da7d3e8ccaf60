use futures::{StreamExt, TryStreamExt};
use indoc::indoc;
use integration_tests::llms::{LlmProviderConfig, OpenAIMock};
use llm::{ChatMessage, CompletionClient, CompletionOptions, UpstreamError};
use serde_json::json;

fn client(upstream: &LlmProviderConfig, config_toml: &str) -> CompletionClient {
    let mut config: config::LlmConfig = toml::from_str(config_toml).unwrap();
    config.api_key = Some(String::from("test-key").into());
    config.base_url = Some(upstream.base_url());

    CompletionClient::new(&config).unwrap()
}

#[tokio::test]
async fn complete_with_defaults() {
    let upstream = OpenAIMock::new().spawn().await.unwrap();
    let client = client(&upstream, "");

    let reply = client.complete("Say hi", client.default_options().clone()).await.unwrap();
    assert_eq!(reply, "Hello!");

    let request = upstream.requests.last();
    assert_eq!(request["model"], json!("gpt-4o-mini"));
    assert_eq!(request["temperature"], json!(0.7));
    assert_eq!(request["stream"], json!(false));
    assert_eq!(request["messages"], json!([{ "role": "user", "content": "Say hi" }]));
    assert!(request.get("max_tokens").is_none());
}

#[tokio::test]
async fn configured_defaults_are_sent() {
    let config = indoc! {r#"
        model = "gpt-4o"
        temperature = 0.2
        max_tokens = 64
    "#};

    let upstream = OpenAIMock::new().spawn().await.unwrap();
    let client = client(&upstream, config);

    client.complete("Say hi", client.default_options().clone()).await.unwrap();

    let request = upstream.requests.last();
    assert_eq!(request["model"], json!("gpt-4o"));
    assert_eq!(request["temperature"], json!(0.2));
    assert_eq!(request["max_tokens"], json!(64));
}

#[tokio::test]
async fn explicit_options_win() {
    let upstream = OpenAIMock::new().spawn().await.unwrap();
    let client = client(&upstream, "");

    let options = CompletionOptions {
        model: "gpt-4.1".to_string(),
        temperature: 1.5,
        max_tokens: Some(10),
    };

    client.complete("Say hi", options).await.unwrap();

    let request = upstream.requests.last();
    assert_eq!(request["model"], json!("gpt-4.1"));
    assert_eq!(request["temperature"], json!(1.5));
    assert_eq!(request["max_tokens"], json!(10));
}

#[tokio::test]
async fn context_is_sent_in_order() {
    let upstream = OpenAIMock::new().with_fragments(["Paris."]).spawn().await.unwrap();
    let client = client(&upstream, "");

    let messages = vec![
        ChatMessage::system("Answer in one word."),
        ChatMessage::user("Capital of Italy?"),
        ChatMessage::assistant("Rome."),
        ChatMessage::user("And of France?"),
    ];

    let reply = client
        .complete_with_context(messages, CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(reply, "Paris.");

    insta::assert_json_snapshot!(upstream.requests.last()["messages"], @r#"
    [
      {
        "content": "Answer in one word.",
        "role": "system"
      },
      {
        "content": "Capital of Italy?",
        "role": "user"
      },
      {
        "content": "Rome.",
        "role": "assistant"
      },
      {
        "content": "And of France?",
        "role": "user"
      }
    ]
    "#);
}

#[tokio::test]
async fn null_content_is_empty_text() {
    let upstream = OpenAIMock::new().with_null_content().spawn().await.unwrap();
    let client = client(&upstream, "");

    let reply = client.complete("Say hi", CompletionOptions::default()).await.unwrap();

    assert_eq!(reply, "");
}

#[tokio::test]
async fn every_call_reaches_the_upstream() {
    let upstream = OpenAIMock::new().spawn().await.unwrap();
    let client = client(&upstream, "");

    for _ in 0..2 {
        let reply = client.complete("Say hi", CompletionOptions::default()).await.unwrap();
        assert_eq!(reply, "Hello!");
    }

    let requests = upstream.requests.all();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn authentication_error() {
    let upstream = OpenAIMock::new()
        .with_auth_error("Incorrect API key provided")
        .spawn()
        .await
        .unwrap();

    let error = client(&upstream, "")
        .complete("Say hi", CompletionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(error, UpstreamError::Authentication(_)));
    insta::assert_snapshot!(error, @"Authentication failed: Incorrect API key provided");
}

#[tokio::test]
async fn rate_limit_error() {
    let upstream = OpenAIMock::new()
        .with_rate_limit("Rate limit reached for requests")
        .spawn()
        .await
        .unwrap();

    let error = client(&upstream, "")
        .complete("Say hi", CompletionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "rate_limit_error");
    insta::assert_snapshot!(error, @"Rate limit exceeded: Rate limit reached for requests");
}

#[tokio::test]
async fn server_error() {
    let upstream = OpenAIMock::new()
        .with_internal_error("The server had an error")
        .spawn()
        .await
        .unwrap();

    let error = client(&upstream, "")
        .complete("Say hi", CompletionOptions::default())
        .await
        .unwrap_err();

    insta::assert_snapshot!(error, @"Upstream API error (500): The server had an error");
}

#[tokio::test]
async fn unreachable_upstream() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let config = config::LlmConfig {
        api_key: Some(String::from("test-key").into()),
        base_url: Some(format!("http://{address}/v1")),
        ..Default::default()
    };

    let client = CompletionClient::new(&config).unwrap();
    let error = client.complete("Say hi", CompletionOptions::default()).await.unwrap_err();

    assert_eq!(error.kind(), "connection_error");

    // Streams report the same failure as their only item.
    let items: Vec<_> = client.complete_stream("Say hi", CompletionOptions::default()).collect().await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(UpstreamError::Connection(_))));
}

#[tokio::test]
async fn stream_yields_fragments_in_order() {
    let upstream = OpenAIMock::new()
        .with_fragments(["The ", "quick ", "fox"])
        .spawn()
        .await
        .unwrap();

    let client = client(&upstream, "");

    let fragments: Vec<String> = client
        .complete_stream("Tell me", CompletionOptions::default())
        .try_collect()
        .await
        .unwrap();

    assert_eq!(fragments, ["The ", "quick ", "fox"]);
    assert_eq!(upstream.requests.last()["stream"], json!(true));
}

#[tokio::test]
async fn stream_is_lazy() {
    let upstream = OpenAIMock::new().spawn().await.unwrap();
    let client = client(&upstream, "");

    let stream = client.complete_stream("Say hi", CompletionOptions::default());
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(upstream.requests.is_empty());

    let fragments: Vec<String> = stream.try_collect().await.unwrap();
    assert_eq!(fragments.concat(), "Hello!");
    assert_eq!(upstream.requests.len(), 1);
}

#[tokio::test]
async fn dropped_stream_sends_nothing() {
    let upstream = OpenAIMock::new().spawn().await.unwrap();
    let client = client(&upstream, "");

    drop(client.complete_stream("Say hi", CompletionOptions::default()));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(upstream.requests.is_empty());
}

#[tokio::test]
async fn in_band_stream_error() {
    let upstream = OpenAIMock::new()
        .with_fragments(["one ", "two ", "three"])
        .with_stream_error_after(2, "The server had an error while processing your request.")
        .spawn()
        .await
        .unwrap();

    let items: Vec<_> = client(&upstream, "")
        .complete_stream("count", CompletionOptions::default())
        .collect()
        .await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_deref().unwrap(), "one ");
    assert_eq!(items[1].as_deref().unwrap(), "two ");

    let error = items[2].as_ref().unwrap_err();
    insta::assert_snapshot!(error, @"Stream interrupted: The server had an error while processing your request.");
}

#[tokio::test]
async fn stream_opening_error() {
    let upstream = OpenAIMock::new()
        .with_auth_error("Incorrect API key provided")
        .spawn()
        .await
        .unwrap();

    let mut stream = client(&upstream, "").complete_stream("Say hi", CompletionOptions::default());

    let first = stream.next().await.unwrap();
    assert!(matches!(first, Err(UpstreamError::Authentication(_))));
    assert!(stream.next().await.is_none());
}
