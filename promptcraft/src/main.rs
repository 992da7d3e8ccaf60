use args::Args;
use clap::Parser;
use env_file::EnvFile;
use server::ServeConfig;
use tokio_util::sync::CancellationToken;

mod args;
mod env_file;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before argument parsing, so `.env` can also carry the PROMPTCRAFT_* variables.
    let env_file = EnvFile::load();
    let args = Args::parse();

    logger::init(&args)?;
    env_file.log();

    let config = args.config()?;
    let listen_address = args.listen_address(&config);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    let serve_config = ServeConfig {
        listen_address,
        config,
        shutdown,
    };

    if let Err(e) = server::serve(serve_config).await {
        log::error!("Server failed to start: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn shutdown_on_ctrl_c(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C, graceful shutdown is unavailable: {e}");
        return;
    }

    log::info!("Received Ctrl-C, shutting down");
    shutdown.cancel();
}
