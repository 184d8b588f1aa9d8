use anyhow::Context;
use cardscore_server::{Api, Config, MemoryStore};
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Directory holding the web client bundle
    #[arg(long)]
    static_dir: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path).context("failed to load config")?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = args.static_dir {
        config.static_dir = Some(dir);
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    let config = config.validate().context("invalid config")?;

    // Create logger
    let logger = tracing_subscriber::fmt().with_max_level(config.log_level);
    if config.json_logs {
        logger.json().init();
    } else {
        logger.init();
    }

    let store = Arc::new(MemoryStore::new());
    let app = Api::from_config(store, &config).router();

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, static_dir = ?config.static_dir, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("axum server error")?;

    Ok(())
}
