//! Telegram bot that replies to `/start` with a button opening the web client.
//!
//! Usage:
//!   TELEGRAM_BOT_TOKEN=<token> cargo run --bin cardscore-bot -- [OPTIONS]
//!
//! Options:
//!   -w, --webapp-url     Public URL of the web client (env WEBAPP_URL)
//!   -a, --api-url        Bot API base (default: https://api.telegram.org)

use anyhow::Context;
use cardscore_client::Bot;
use clap::Parser;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat bot that links to card score")]
struct Args {
    #[arg(short, long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(short, long, env = "WEBAPP_URL", default_value = "http://localhost:3000")]
    webapp_url: String,

    #[arg(short, long, default_value = "https://api.telegram.org")]
    api_url: String,

    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let bot = Bot::new(&args.api_url, &args.token, &args.webapp_url)
        .context("failed to create bot")?;
    info!(webapp_url = %args.webapp_url, "starting bot");
    bot.run().await.context("bot stopped")?;
    Ok(())
}
