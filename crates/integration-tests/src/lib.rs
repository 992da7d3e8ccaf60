pub mod llms;

use std::net::SocketAddr;
use std::time::Duration;

use config::Config;
use server::ServeConfig;
use tokio::{net::TcpListener, task::JoinHandle, time::timeout};
use tokio_util::sync::CancellationToken;

use crate::llms::{LlmProviderConfig, OpenAIMock};

/// Test client for making HTTP requests to the test server
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    /// Create a new test client for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.try_get(path).await.unwrap()
    }

    async fn try_get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(format!("{}{}", self.base_url, path)).send().await
    }

    /// Send a POST request to the given path with a url-encoded form body
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Submit a prompt to a stream route and read the whole reply
    pub async fn prompt(&self, path: &str, prompt: &str) -> String {
        let response = self.post_form(path, &[("prompt", prompt)]).await;
        assert_eq!(response.status(), 200);

        response.text().await.unwrap()
    }
}

/// Collects what a test server needs before it starts.
#[derive(Default)]
pub struct TestServerBuilder {
    llm: Option<LlmProviderConfig>,
}

impl TestServerBuilder {
    /// Start a mock upstream and point the server's completion client at it.
    pub async fn spawn_llm(&mut self, mock: OpenAIMock) {
        self.llm = Some(mock.spawn().await.unwrap());
    }

    /// Start the server with the given TOML configuration.
    pub async fn build(self, config_toml: &str) -> TestServer {
        let mut config: Config = toml::from_str(config_toml).unwrap();
        config.validate().unwrap();

        if let Some(llm) = &self.llm {
            config.llm.api_key = Some(String::from("test-key").into());
            config.llm.base_url = Some(llm.base_url());
        }

        TestServer::spawn(config).await
    }
}

/// Test server that manages the lifecycle of a server instance
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl TestServer {
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::default()
    }

    /// Start a new test server with the given TOML configuration and no mock upstream
    pub async fn start(config_toml: &str) -> Self {
        Self::builder().build(config_toml).await
    }

    async fn spawn(config: Config) -> Self {
        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let shutdown = CancellationToken::new();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
            shutdown: shutdown.clone(),
        };

        let handle = tokio::spawn(async move {
            // Drop the listener so the server can bind to the address
            drop(listener);
            server::serve(serve_config).await
        });

        let client = TestClient::new(format!("http://{address}"));

        // Wait until the server answers
        let mut retries = 20;
        while retries > 0 {
            if let Ok(Ok(_)) = timeout(Duration::from_millis(100), client.try_get("/")).await {
                break;
            }

            assert!(!handle.is_finished(), "server stopped during startup");

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestServer {
            client,
            address,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stop the server gracefully and wait for it to finish.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.shutdown.cancel();

        match self.handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
