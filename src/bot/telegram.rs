use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use crate::api::{CoinGeckoClient, MarketEntry, PriceSource};
use crate::constants::DEFAULT_TOP_COUNT;
use crate::errors::BotError;
use crate::monitor::{AddOutcome, MonitorHandle};
use crate::utils::{format_market_cap, format_price, format_signed_pct, Config};

use super::commands::Command;

/// Main Telegram bot struct: wires the command dispatcher to the monitor.
pub struct TelegramBot {
    bot: Bot,
    config: Arc<Config>,
    monitor: MonitorHandle,
    market_data: Arc<CoinGeckoClient>,
}

impl TelegramBot {
    pub fn new(
        bot: Bot,
        config: Arc<Config>,
        monitor: MonitorHandle,
        market_data: Arc<CoinGeckoClient>,
    ) -> Self {
        Self {
            bot,
            config,
            monitor,
            market_data,
        }
    }

    /// Run the bot dispatcher until ctrl-c.
    pub async fn run(&self) {
        info!("🤖 Starting Telegram command dispatcher");

        let handler = Update::filter_message()
            .filter_command::<Command>()
            .endpoint(Self::handle_command);

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![
                self.config.clone(),
                self.monitor.clone(),
                self.market_data.clone()
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        bot: Bot,
        msg: Message,
        cmd: Command,
        config: Arc<Config>,
        monitor: MonitorHandle,
        market_data: Arc<CoinGeckoClient>,
    ) -> ResponseResult<()> {
        // Commands from any other chat are dropped without a reply.
        if !config.is_authorized_chat(msg.chat.id.0) {
            return Ok(());
        }

        info!("Processing command {:?} from chat {}", cmd, msg.chat.id);

        let reply = match cmd {
            Command::List => match monitor.list_assets().await {
                Ok(coins) => format!("Currently tracking:\n{}", coins.join(", ")),
                Err(e) => format!("❌ Error listing tracked coins: {}", e),
            },
            Command::Top(arg) => {
                let count = arg
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_TOP_COUNT);
                match market_data.top_by_market_cap(count).await {
                    Ok(entries) => render_top(&entries, count),
                    Err(e) => {
                        warn!("Top market cap fetch failed: {}", e);
                        format!("❌ Error fetching top cryptocurrencies: {}", e)
                    }
                }
            }
            Command::Add(arg) => {
                let coin = arg.trim().to_lowercase();
                if coin.is_empty() {
                    "Usage: /add <coin>\nExample: /add cardano".to_string()
                } else {
                    match monitor.add_asset(&coin).await {
                        Ok(AddOutcome::Added) => format!("✅ Added {} to tracking list!", coin),
                        Ok(AddOutcome::AlreadyTracked) => {
                            format!("{} is already being tracked!", coin)
                        }
                        Err(BotError::AssetNotFound(_)) => {
                            format!("❌ Could not find cryptocurrency: {}", coin)
                        }
                        Err(e) => format!("❌ Error adding {}: {}", coin, e),
                    }
                }
            }
            Command::Remove(arg) => {
                let coin = arg.trim().to_lowercase();
                if coin.is_empty() {
                    "Usage: /remove <coin>\nExample: /remove bitcoin".to_string()
                } else {
                    match monitor.remove_asset(&coin).await {
                        Ok(true) => format!("✅ Removed {} from tracking list!", coin),
                        Ok(false) => format!("❌ {} is not in the tracking list!", coin),
                        Err(e) => format!("❌ Error removing {}: {}", coin, e),
                    }
                }
            }
            Command::Help => HELP_TEXT.to_string(),
        };

        bot.send_message(msg.chat.id, reply)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

const HELP_TEXT: &str = "\
<b>Available Commands:</b>\n\n\
/list - Show all tracked cryptocurrencies\n\
/top [N] - Show top N cryptocurrencies by market cap (default: 10)\n\
/add - Add a new cryptocurrency to track\n\
/remove - Remove a cryptocurrency from tracking\n\
/help - Show this help message\n\n\
Examples:\n\
• /add cardano\n\
• /remove bitcoin\n\
• /top 15";

fn render_top(entries: &[MarketEntry], count: usize) -> String {
    let mut message = format!("<b>Top {} Cryptocurrencies</b>\nby Market Cap 📊\n\n", count);

    for (rank, entry) in entries.iter().enumerate() {
        let change = entry.price_change_24h.unwrap_or(0.0);
        let emoji = if change >= 0.0 { "🟢" } else { "🔴" };
        message.push_str(&format!(
            "{}. {} <b>{}</b>\n💵 Price: {}\n📊 24h: {}\n💰 Market Cap: {}\n\n",
            rank + 1,
            emoji,
            entry.symbol.to_uppercase(),
            format_price(entry.current_price),
            format_signed_pct(change),
            format_market_cap(entry.market_cap),
        ));
    }

    message
}
