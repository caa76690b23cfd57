use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use teloxide::Bot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coinwatch::alerts::ChangeDetector;
use coinwatch::api::CoinGeckoClient;
use coinwatch::bot::{TelegramBot, TelegramNotifier};
use coinwatch::db::PriceStore;
use coinwatch::monitor::MonitorEngine;
use coinwatch::monitoring;
use coinwatch::utils::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    info!("🚀 Starting coinwatch");

    let store = Arc::new(match &config.database_path {
        Some(path) => PriceStore::open(path)?,
        None => PriceStore::open_in_memory()?,
    });

    let market_data = Arc::new(CoinGeckoClient::new(config.coingecko_api_key.clone())?);
    let bot = Bot::new(&config.telegram_bot_token);
    let notifier = Arc::new(TelegramNotifier::new(bot.clone(), config.telegram_chat_id));

    let monitor = MonitorEngine::spawn(
        market_data.clone(),
        store,
        notifier,
        ChangeDetector::new(config.alert_threshold_pct),
        Duration::from_millis(config.check_interval_ms),
        config.tracked_coins.clone(),
    );
    info!("📈 Price monitoring started");

    let health = tokio::spawn(monitoring::serve(config.port));

    // Blocks until ctrl-c stops the dispatcher.
    TelegramBot::new(bot, config, monitor.clone(), market_data)
        .run()
        .await;

    monitor.shutdown().await;
    health.abort();
    if let Err(e) = health.await {
        if !e.is_cancelled() {
            warn!("Health server task failed: {}", e);
        }
    }

    info!("Shutdown complete");
    Ok(())
}
