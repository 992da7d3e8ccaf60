//! Promptcraft server library.
//!
//! Provides a reusable server function to serve Promptcraft either for the binary, or for the integration tests.

#![deny(missing_docs)]

mod health;
mod page;
mod render;
mod site;
mod stream;

use std::net::SocketAddr;

use anyhow::anyhow;
use axum::{
    Router,
    extract::{Form, State},
    routing::{get, post},
};
use config::{Config, STATIC_PREFIX};
use llm::CompletionClient;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use crate::{page::Page, stream::PromptForm};

/// Configuration for serving Promptcraft.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to
    pub listen_address: SocketAddr,
    /// The deserialized Promptcraft TOML configuration.
    pub config: Config,
    /// Cancelling this token shuts the server down gracefully.
    pub shutdown: CancellationToken,
}

/// State shared by all request handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// `None` when no API key was available at startup.
    pub(crate) client: Option<CompletionClient>,
}

/// Starts and runs the Promptcraft server with the provided configuration.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        shutdown,
    }: ServeConfig,
) -> anyhow::Result<()> {
    let client = match CompletionClient::new(&config.llm) {
        Ok(client) => Some(client),
        Err(e) => {
            log::warn!("Completion client unavailable, prompt streams will only report an error: {e}");
            None
        }
    };

    let app = router(&config, client);

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    let local_address = listener.local_addr()?;
    log::info!("Promptcraft available at: http://{local_address}");

    if config.server.health.enabled {
        log::info!("Health check endpoint exposed at http://{local_address}{}", config.server.health.path);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;

    log::info!("Promptcraft stopped");

    Ok(())
}

/// Builds the application router.
///
/// The completion client is injected so callers can run the pages against any
/// upstream; `None` leaves every prompt stream answering with an error.
pub fn router(config: &Config, client: Option<CompletionClient>) -> Router {
    let mut app = Router::new()
        .route("/", get(site::index).post(site::echo))
        .route("/options", get(site::options));

    for page in Page::ALL {
        app = app.route(&page.path(), get(move || site::show(page)));

        if page.streams() {
            app = app.route(
                &page.stream_path(),
                post(move |state: State<AppState>, form: Form<PromptForm>| stream::stream_prompt(page, state, form)),
            );
        }
    }

    let mut app = app.with_state(AppState { client });

    if let Some(static_dir) = &config.server.static_dir {
        log::debug!("Serving static files from {}", static_dir.display());
        app = app.nest_service(STATIC_PREFIX, ServeDir::new(static_dir));
    }

    if config.server.health.enabled {
        app = app.route(&config.server.health.path, get(health::health));
    }

    app
}
