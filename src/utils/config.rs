use serde::{Deserialize, Serialize};
use std::env;

use crate::constants::{ALERT_THRESHOLD_PCT, DEFAULT_TRACKED_COINS, PRICE_CHECK_INTERVAL_MS};
use crate::errors::{BotError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // API Keys
    pub telegram_bot_token: String,
    pub telegram_chat_id: i64,
    pub coingecko_api_key: Option<String>,

    // Monitoring configuration
    pub tracked_coins: Vec<String>,
    pub check_interval_ms: u64,
    pub alert_threshold_pct: f64,

    // Persistence (None keeps history in memory, like the default deployment)
    pub database_path: Option<String>,

    // Health endpoint
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Required settings
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .map_err(|_| BotError::Config("TELEGRAM_BOT_TOKEN not set".into()))?,
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID")
                .map_err(|_| BotError::Config("TELEGRAM_CHAT_ID not set".into()))?
                .parse()
                .map_err(|_| BotError::Config("TELEGRAM_CHAT_ID must be a numeric chat id".into()))?,

            // Optional settings
            coingecko_api_key: env::var("COINGECKO_API_KEY").ok(),
            tracked_coins: env::var("TRACKED_COINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    DEFAULT_TRACKED_COINS.iter().map(|s| s.to_string()).collect()
                }),
            check_interval_ms: env::var("PRICE_CHECK_INTERVAL_MS")
                .unwrap_or_else(|_| PRICE_CHECK_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(PRICE_CHECK_INTERVAL_MS),
            alert_threshold_pct: env::var("ALERT_THRESHOLD_PCT")
                .unwrap_or_else(|_| ALERT_THRESHOLD_PCT.to_string())
                .parse()
                .unwrap_or(ALERT_THRESHOLD_PCT),
            database_path: env::var("DATABASE_PATH").ok(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        })
    }

    /// Commands are honored only from the configured chat; all others are
    /// silently ignored.
    pub fn is_authorized_chat(&self, chat_id: i64) -> bool {
        chat_id == self.telegram_chat_id
    }
}
