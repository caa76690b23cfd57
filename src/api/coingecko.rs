use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::constants::{COINGECKO_BASE_URL, FETCH_TIMEOUT_SECS, MARKETS_PAGE_SIZE};
use crate::errors::{BotError, Result};

use super::{MarketEntry, PriceSource};

/// CoinGecko REST client (demo API tier).
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotQuote {
    usd: f64,
}

#[derive(Debug, Deserialize)]
struct MarketCoin {
    symbol: String,
    current_price: f64,
    price_change_percentage_24h: Option<f64>,
    market_cap: f64,
}

impl CoinGeckoClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: COINGECKO_BASE_URL.to_string(),
            api_key,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let mut req = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.header("x-cg-demo-api-key", key);
        }
        req
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn spot_price(&self, symbol: &str) -> Result<f64> {
        let response = self
            .get("/simple/price")
            .query(&[("ids", symbol), ("vs_currencies", "usd")])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::RateLimited);
        }

        let quotes: HashMap<String, SpotQuote> = response.error_for_status()?.json().await?;
        debug!("Fetched spot price for {}", symbol);

        quotes
            .get(symbol)
            .map(|quote| quote.usd)
            .ok_or_else(|| BotError::AssetNotFound(symbol.to_string()))
    }

    async fn top_by_market_cap(&self, count: usize) -> Result<Vec<MarketEntry>> {
        let per_page = MARKETS_PAGE_SIZE.to_string();
        let response = self
            .get("/coins/markets")
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("sparkline", "false"),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::RateLimited);
        }

        let coins: Vec<MarketCoin> = response.error_for_status()?.json().await?;

        Ok(coins
            .into_iter()
            .take(count)
            .map(|coin| MarketEntry {
                symbol: coin.symbol,
                current_price: coin.current_price,
                price_change_24h: coin.price_change_percentage_24h,
                market_cap: coin.market_cap,
            })
            .collect())
    }
}
