use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use coinwatch::alerts::ChangeDetector;
use coinwatch::api::{MarketEntry, PriceSource};
use coinwatch::bot::Notifier;
use coinwatch::constants::HOUR_MS;
use coinwatch::db::PriceStore;
use coinwatch::errors::{BotError, Result};
use coinwatch::monitor::{AddOutcome, MonitorEngine};

/// Price source that pops one scripted price per fetch; an exhausted or
/// unknown symbol fails the fetch.
#[derive(Default)]
struct ScriptedSource {
    prices: Mutex<HashMap<String, VecDeque<f64>>>,
}

impl ScriptedSource {
    fn script(self, symbol: &str, prices: &[f64]) -> Self {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), prices.iter().copied().collect());
        self
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn spot_price(&self, symbol: &str) -> Result<f64> {
        self.prices
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| BotError::AssetNotFound(symbol.to_string()))
    }

    async fn top_by_market_cap(&self, _count: usize) -> Result<Vec<MarketEntry>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    fn count_containing(&self, needle: &str) -> usize {
        self.messages()
            .iter()
            .filter(|m| m.contains(needle))
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn engine_with(
    source: ScriptedSource,
    coins: &[&str],
) -> (MonitorEngine, Arc<RecordingNotifier>, Arc<PriceStore>) {
    let store = Arc::new(PriceStore::open_in_memory().unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let (engine, _handle) = MonitorEngine::new(
        Arc::new(source),
        store.clone(),
        notifier.clone(),
        ChangeDetector::new(5.0),
        Duration::from_millis(300_000),
        coins.iter().map(|s| s.to_string()).collect(),
    );
    (engine, notifier, store)
}

#[tokio::test]
async fn instant_alert_fires_on_six_percent_move() {
    let source = ScriptedSource::default().script("bitcoin", &[100.0, 106.0]);
    let (mut engine, notifier, _store) = engine_with(source, &["bitcoin"]);

    engine.initialize().await;
    assert!(notifier.messages().is_empty(), "initialization must not alert");

    engine.run_cycle().await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2, "one alert plus one consolidated update");
    assert!(messages[0].contains("PRICE ALERT"));
    assert!(messages[0].contains("increased"));
    assert!(messages[0].contains("6.00%"));
    assert!(messages[1].contains("Crypto Price Update"));
    assert!(messages[1].contains("BITCOIN"));
}

#[tokio::test]
async fn no_alert_below_threshold() {
    let source = ScriptedSource::default().script("bitcoin", &[100.0, 104.0]);
    let (mut engine, notifier, _store) = engine_with(source, &["bitcoin"]);

    engine.initialize().await;
    engine.run_cycle().await;

    assert_eq!(notifier.count_containing("PRICE ALERT"), 0);
    assert_eq!(notifier.count_containing("Crypto Price Update"), 1);
}

#[tokio::test]
async fn first_successful_fetch_seeds_the_cache() {
    // No initialization: the first cycle only seeds, the second compares.
    let source = ScriptedSource::default().script("bitcoin", &[100.0, 106.0]);
    let (mut engine, notifier, _store) = engine_with(source, &["bitcoin"]);

    engine.run_cycle().await;
    assert!(
        notifier.messages().is_empty(),
        "no prior price, so no update and no alert"
    );

    engine.run_cycle().await;
    assert_eq!(notifier.count_containing("PRICE ALERT"), 1);
}

#[tokio::test]
async fn fetch_failure_is_isolated_per_asset() {
    let source = ScriptedSource::default()
        .script("avax", &[100.0, 106.0])
        .script("bonk", &[50.0]); // second fetch fails
    let (mut engine, notifier, _store) = engine_with(source, &["avax", "bonk"]);

    engine.initialize().await;
    engine.run_cycle().await;

    let messages = notifier.messages();
    assert_eq!(notifier.count_containing("PRICE ALERT"), 1);
    let update = messages
        .iter()
        .find(|m| m.contains("Crypto Price Update"))
        .expect("consolidated update must still go out");
    assert!(update.contains("AVAX"));
    assert!(!update.contains("BONK"), "failed fetch must not appear");
}

#[tokio::test]
async fn hourly_alert_fires_once_per_hour() {
    let source = ScriptedSource::default().script("bitcoin", &[100.0, 106.0, 112.0]);
    let (mut engine, notifier, store) = engine_with(source, &["bitcoin"]);

    // History old enough for the rolling-hour comparison.
    let now = Utc::now().timestamp_millis();
    store
        .insert("bitcoin", 100.0, now - HOUR_MS - 60_000)
        .unwrap();

    engine.initialize().await;

    engine.run_cycle().await;
    assert_eq!(notifier.count_containing("HOURLY ALERT"), 1);

    // The move persists, but the cooldown suppresses a second hourly alert.
    engine.run_cycle().await;
    assert_eq!(notifier.count_containing("HOURLY ALERT"), 1);
    // Instant alerts are not deduplicated.
    assert_eq!(notifier.count_containing("PRICE ALERT"), 2);
}

#[tokio::test]
async fn hourly_check_skipped_without_old_history() {
    let source = ScriptedSource::default().script("bitcoin", &[100.0, 110.0]);
    let (mut engine, notifier, _store) = engine_with(source, &["bitcoin"]);

    engine.initialize().await;
    engine.run_cycle().await;

    // Tracked for less than an hour: only the instant tier may fire.
    assert_eq!(notifier.count_containing("HOURLY ALERT"), 0);
    assert_eq!(notifier.count_containing("PRICE ALERT"), 1);
}

#[tokio::test]
async fn zero_quote_is_treated_as_unavailable() {
    let source = ScriptedSource::default().script("bitcoin", &[0.0, 100.0, 106.0]);
    let (mut engine, notifier, store) = engine_with(source, &["bitcoin"]);

    // The zero quote at startup leaves the coin uncached and unpersisted.
    engine.initialize().await;
    assert!(store.latest("bitcoin").unwrap().is_none());

    // First real quote only seeds the cache; there is no prior to compare.
    engine.run_cycle().await;
    assert!(notifier.messages().is_empty());

    // 100 -> 106 alerts with a finite percentage.
    engine.run_cycle().await;
    assert!(notifier.messages().iter().all(|m| !m.contains("inf")));
    let messages = notifier.messages();
    let alert = messages
        .iter()
        .find(|m| m.contains("PRICE ALERT"))
        .expect("6% move must alert");
    assert!(alert.contains("increased by 6.00%"));
}

#[tokio::test]
async fn add_asset_rejects_zero_quotes() {
    let source = ScriptedSource::default()
        .script("bitcoin", &[100.0])
        .script("zeroed", &[0.0]);
    let (mut engine, _notifier, _store) = engine_with(source, &["bitcoin"]);

    engine.initialize().await;

    let err = engine.add_asset("zeroed").await.unwrap_err();
    assert!(matches!(err, BotError::Validation(_)));
    assert_eq!(engine.list_assets(), vec!["bitcoin".to_string()]);
}

#[tokio::test]
async fn add_asset_rejects_unfetchable_symbols() {
    let source = ScriptedSource::default().script("bitcoin", &[100.0]);
    let (mut engine, _notifier, _store) = engine_with(source, &["bitcoin"]);

    engine.initialize().await;

    let err = engine.add_asset("notacoin").await.unwrap_err();
    assert!(matches!(err, BotError::AssetNotFound(_)));
    assert_eq!(engine.list_assets(), vec!["bitcoin".to_string()]);
}

#[tokio::test]
async fn add_asset_validates_seeds_and_deduplicates() {
    let source = ScriptedSource::default()
        .script("bitcoin", &[100.0])
        .script("cardano", &[1.23]);
    let (mut engine, _notifier, store) = engine_with(source, &["bitcoin"]);

    engine.initialize().await;

    assert_eq!(engine.add_asset("cardano").await.unwrap(), AddOutcome::Added);
    assert_eq!(
        engine.list_assets(),
        vec!["bitcoin".to_string(), "cardano".to_string()]
    );
    // The validating fetch persisted a first sample.
    assert_eq!(store.latest("cardano").unwrap().unwrap().price, 1.23);

    // A duplicate add is a no-op and must not consume another fetch.
    assert_eq!(
        engine.add_asset("cardano").await.unwrap(),
        AddOutcome::AlreadyTracked
    );
}

#[tokio::test]
async fn remove_asset_only_drops_tracking() {
    let source = ScriptedSource::default().script("bitcoin", &[100.0]);
    let (mut engine, _notifier, _store) = engine_with(source, &["bitcoin"]);

    engine.initialize().await;

    assert!(engine.remove_asset("bitcoin"));
    assert!(engine.list_assets().is_empty());
    assert!(!engine.remove_asset("bitcoin"));
}
