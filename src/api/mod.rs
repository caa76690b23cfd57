mod coingecko;

pub use coingecko::CoinGeckoClient;

use async_trait::async_trait;

use crate::errors::Result;

/// One row of the market-cap ranking.
#[derive(Debug, Clone)]
pub struct MarketEntry {
    pub symbol: String,
    pub current_price: f64,
    pub price_change_24h: Option<f64>,
    pub market_cap: f64,
}

/// Spot price and market ranking source. The monitor only talks to this
/// trait, so tests can inject a scripted implementation.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current USD spot price for a coin id.
    async fn spot_price(&self, symbol: &str) -> Result<f64>;

    /// Top `count` coins ordered by market cap, descending.
    async fn top_by_market_cap(&self, count: usize) -> Result<Vec<MarketEntry>>;
}
