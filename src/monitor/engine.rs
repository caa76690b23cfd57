use chrono::{Local, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::alerts::{ChangeDetector, PriceChange};
use crate::api::PriceSource;
use crate::bot::Notifier;
use crate::constants::{DAY_MS, HOUR_MS};
use crate::db::PriceStore;
use crate::errors::{BotError, Result};
use crate::utils::{format_price, format_signed_pct};

/// One asset's contribution to the consolidated per-cycle update message.
#[derive(Debug, Clone)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: f64,
    pub percentage_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyTracked,
}

// Actor messages for the monitor engine
#[derive(Debug)]
pub enum MonitorMessage {
    ListAssets {
        respond: oneshot::Sender<Vec<String>>,
    },
    AddAsset {
        symbol: String,
        respond: oneshot::Sender<Result<AddOutcome>>,
    },
    RemoveAsset {
        symbol: String,
        respond: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Handle for talking to the monitor actor. Cloneable; all operations are
/// serialized onto the engine's single consumer loop, so a tracked-set
/// mutation can never interleave with a running cycle.
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorMessage>,
}

impl MonitorHandle {
    pub async fn list_assets(&self) -> Result<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.send(MonitorMessage::ListAssets { respond: tx }).await?;
        rx.await
            .map_err(|_| BotError::internal("Monitor dropped the request"))
    }

    pub async fn add_asset(&self, symbol: &str) -> Result<AddOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(MonitorMessage::AddAsset {
            symbol: symbol.to_string(),
            respond: tx,
        })
        .await?;
        rx.await
            .map_err(|_| BotError::internal("Monitor dropped the request"))?
    }

    pub async fn remove_asset(&self, symbol: &str) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(MonitorMessage::RemoveAsset {
            symbol: symbol.to_string(),
            respond: tx,
        })
        .await?;
        rx.await
            .map_err(|_| BotError::internal("Monitor dropped the request"))
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(MonitorMessage::Shutdown).await;
    }

    async fn send(&self, msg: MonitorMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| BotError::internal("Monitor unavailable"))
    }
}

/// The price monitor actor. Owns the tracked-asset set, the last-price
/// cache, and the hourly-alert cooldown map; one task drives both the
/// polling cycles and the operator mutations.
pub struct MonitorEngine {
    source: Arc<dyn PriceSource>,
    store: Arc<PriceStore>,
    notifier: Arc<dyn Notifier>,
    detector: ChangeDetector,
    check_interval: Duration,
    tracked: BTreeSet<String>,
    last_prices: HashMap<String, f64>,
    last_hourly_alerts: HashMap<String, i64>,
    receiver: mpsc::Receiver<MonitorMessage>,
}

impl MonitorEngine {
    pub fn new(
        source: Arc<dyn PriceSource>,
        store: Arc<PriceStore>,
        notifier: Arc<dyn Notifier>,
        detector: ChangeDetector,
        check_interval: Duration,
        initial_coins: Vec<String>,
    ) -> (Self, MonitorHandle) {
        let (sender, receiver) = mpsc::channel(32);
        let engine = Self {
            source,
            store,
            notifier,
            detector,
            check_interval,
            tracked: initial_coins.into_iter().collect(),
            last_prices: HashMap::new(),
            last_hourly_alerts: HashMap::new(),
            receiver,
        };
        (engine, MonitorHandle { sender })
    }

    /// Spawn the actor loop and return its handle.
    pub fn spawn(
        source: Arc<dyn PriceSource>,
        store: Arc<PriceStore>,
        notifier: Arc<dyn Notifier>,
        detector: ChangeDetector,
        check_interval: Duration,
        initial_coins: Vec<String>,
    ) -> MonitorHandle {
        let (engine, handle) = Self::new(
            source,
            store,
            notifier,
            detector,
            check_interval,
            initial_coins,
        );
        tokio::spawn(engine.run());
        handle
    }

    async fn run(mut self) {
        self.initialize().await;

        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first
        // cycle runs one interval after initialization.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_cycle().await,
                msg = self.receiver.recv() => match msg {
                    Some(MonitorMessage::ListAssets { respond }) => {
                        let _ = respond.send(self.list_assets());
                    }
                    Some(MonitorMessage::AddAsset { symbol, respond }) => {
                        let _ = respond.send(self.add_asset(&symbol).await);
                    }
                    Some(MonitorMessage::RemoveAsset { symbol, respond }) => {
                        let _ = respond.send(self.remove_asset(&symbol));
                    }
                    Some(MonitorMessage::Shutdown) | None => break,
                },
            }
        }

        info!("Price monitor stopped");
    }

    /// Seed the last-price cache and persist one sample per tracked coin.
    /// A coin whose fetch fails stays uncached and is picked up by a later
    /// successful cycle.
    pub async fn initialize(&mut self) {
        for symbol in self.tracked.clone() {
            if let Err(e) = self.initialize_coin(&symbol).await {
                warn!("No initial price for {}: {}", symbol, e);
            }
        }
    }

    /// Fetch a spot price and reject non-positive quotes. A zero quote is
    /// handled like any other failed fetch: the asset is unavailable this
    /// cycle. This keeps every cached and persisted price positive, which
    /// the percentage-change math relies on.
    async fn fetch_price(&self, symbol: &str) -> Result<f64> {
        let price = self.source.spot_price(symbol).await?;
        if price <= 0.0 {
            return Err(BotError::Validation(format!(
                "Non-positive quote {} for {}",
                price, symbol
            )));
        }
        Ok(price)
    }

    async fn initialize_coin(&mut self, symbol: &str) -> Result<()> {
        let price = self.fetch_price(symbol).await?;
        self.last_prices.insert(symbol.to_string(), price);
        info!("Initial {} price: {}", symbol.to_uppercase(), format_price(price));

        if let Err(e) = self
            .store
            .insert(symbol, price, Utc::now().timestamp_millis())
        {
            error!("Failed to persist initial {} price: {}", symbol, e);
        }
        Ok(())
    }

    /// One polling cycle: fetch, persist, detect, notify, prune. Failures
    /// are isolated per asset; the next cycle is the retry mechanism.
    pub async fn run_cycle(&mut self) {
        let now = Utc::now().timestamp_millis();
        debug!("Starting price check cycle");

        let mut updates: Vec<PriceUpdate> = Vec::new();

        for symbol in self.tracked.clone() {
            let old_price = self.last_prices.get(&symbol).copied();

            let new_price = match self.fetch_price(&symbol).await {
                Ok(price) => price,
                Err(BotError::RateLimited) => {
                    error!(
                        "Rate limit exceeded fetching {}; consider upgrading the CoinGecko plan",
                        symbol
                    );
                    continue;
                }
                Err(e) => {
                    error!("Failed to fetch price for {}: {}", symbol, e);
                    continue;
                }
            };

            if let Some(old_price) = old_price {
                let change = PriceChange::between(old_price, new_price);
                info!(
                    "{}: {} ({})",
                    symbol.to_uppercase(),
                    format_price(new_price),
                    format_signed_pct(change.percentage_change)
                );

                if let Err(e) = self.store.insert(&symbol, new_price, now) {
                    error!("Failed to persist {} price: {}", symbol, e);
                }

                self.check_hourly(&symbol, now).await;

                if let Some(alert) = self.detector.evaluate_instant(&symbol, old_price, new_price)
                {
                    self.notify(&alert.render()).await;
                }

                updates.push(PriceUpdate {
                    symbol: symbol.clone(),
                    price: new_price,
                    percentage_change: change.percentage_change,
                });
            }

            // First successful fetch seeds the cache for future cycles.
            self.last_prices.insert(symbol, new_price);
        }

        if !updates.is_empty() {
            self.notify(&render_price_update(&updates)).await;
        }

        if let Err(e) = self.store.delete_older_than(now - DAY_MS) {
            error!("Failed to prune price history: {}", e);
        }
    }

    /// Compare the just-persisted price against the most recent sample at
    /// least one hour old. Skipped silently while the coin has less than an
    /// hour of history.
    async fn check_hourly(&mut self, symbol: &str, now: i64) {
        let hour_ago = match self.store.latest_at_or_before(symbol, now - HOUR_MS) {
            Ok(Some(sample)) => sample,
            Ok(None) => return,
            Err(e) => {
                error!("Failed to read hourly history for {}: {}", symbol, e);
                return;
            }
        };
        let current = match self.store.latest(symbol) {
            Ok(Some(sample)) => sample,
            Ok(None) => return,
            Err(e) => {
                error!("Failed to read latest sample for {}: {}", symbol, e);
                return;
            }
        };

        let last_alert = self.last_hourly_alerts.get(symbol).copied();
        if let Some(alert) =
            self.detector
                .evaluate_hourly(symbol, hour_ago.price, current.price, last_alert, now)
        {
            self.notify(&alert.render()).await;
            self.last_hourly_alerts.insert(symbol.to_string(), now);
        }
    }

    pub fn list_assets(&self) -> Vec<String> {
        self.tracked.iter().cloned().collect()
    }

    /// Add a coin after a validating fetch. A failed fetch rejects the add
    /// and leaves the tracked set unchanged; a successful one seeds the
    /// cache and persists a first sample, same as startup initialization.
    pub async fn add_asset(&mut self, symbol: &str) -> Result<AddOutcome> {
        if self.tracked.contains(symbol) {
            return Ok(AddOutcome::AlreadyTracked);
        }

        self.initialize_coin(symbol).await?;
        self.tracked.insert(symbol.to_string());
        info!("Now tracking {}", symbol);
        Ok(AddOutcome::Added)
    }

    /// Drop a coin from the tracked set. Cache and cooldown entries are left
    /// behind; they are ignored unless the coin is re-added, which runs the
    /// full add path again.
    pub fn remove_asset(&mut self, symbol: &str) -> bool {
        let removed = self.tracked.remove(symbol);
        if removed {
            info!("Stopped tracking {}", symbol);
        }
        removed
    }

    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            error!("Failed to deliver Telegram message: {}", e);
        }
    }
}

/// Consolidated per-cycle summary covering every updated asset.
pub fn render_price_update(updates: &[PriceUpdate]) -> String {
    let mut message = format!(
        "<b>💰 Crypto Price Update</b>\n🕒 {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    for update in updates {
        let emoji = if update.percentage_change >= 0.0 {
            "🟢"
        } else {
            "🔴"
        };
        message.push_str(&format!(
            "{} <b>{}</b>\n💵 Price: {}\n📊 Change: {}\n\n",
            emoji,
            update.symbol.to_uppercase(),
            format_price(update.price),
            format_signed_pct(update.percentage_change),
        ));
    }

    message
}
