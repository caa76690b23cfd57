use crate::constants::HOUR_MS;
use crate::utils::formatting::format_price;

/// Percentage change from `old_price` to `new_price`.
///
/// Callers must guarantee `old_price > 0`; every price that reaches the
/// detector comes from a successful fetch or a persisted sample, both of
/// which are positive.
pub fn compute_change(old_price: f64, new_price: f64) -> f64 {
    (new_price - old_price) / old_price * 100.0
}

/// A single old/new price comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub old_price: f64,
    pub new_price: f64,
    pub percentage_change: f64,
}

impl PriceChange {
    pub fn between(old_price: f64, new_price: f64) -> Self {
        Self {
            old_price,
            new_price,
            percentage_change: compute_change(old_price, new_price),
        }
    }
}

/// Which comparison window triggered the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertWindow {
    /// Previous cycle's cached price vs the freshly fetched one.
    Instant,
    /// Most recent persisted sample at least one hour old vs the current one.
    Hourly,
}

/// A triggered, ready-to-render alert.
#[derive(Debug, Clone)]
pub struct Alert {
    pub window: AlertWindow,
    pub symbol: String,
    pub change: PriceChange,
}

impl Alert {
    fn direction(&self) -> &'static str {
        if self.change.percentage_change > 0.0 {
            "increased"
        } else {
            "decreased"
        }
    }

    /// Render the Telegram HTML message for this alert.
    pub fn render(&self) -> String {
        let magnitude = self.change.percentage_change.abs();
        match self.window {
            AlertWindow::Instant => format!(
                "🚨 <b>PRICE ALERT</b> 🚨\n\n\
                 {} has {} by {:.2}%\n\n\
                 Old price: {}\n\
                 New price: {}",
                self.symbol.to_uppercase(),
                self.direction(),
                magnitude,
                format_price(self.change.old_price),
                format_price(self.change.new_price),
            ),
            AlertWindow::Hourly => format!(
                "🚨 <b>HOURLY ALERT</b> 🚨\n\n\
                 {} has {} by {:.2}% in the last hour\n\n\
                 Hour ago: {}\n\
                 Current: {}",
                self.symbol.to_uppercase(),
                self.direction(),
                magnitude,
                format_price(self.change.old_price),
                format_price(self.change.new_price),
            ),
        }
    }
}

/// Threshold-crossing detection for both alert windows.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    threshold_pct: f64,
}

impl ChangeDetector {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    /// Cycle-over-cycle check. No deduplication at this tier: the polling
    /// interval is itself the rate limit.
    pub fn evaluate_instant(&self, symbol: &str, old_price: f64, new_price: f64) -> Option<Alert> {
        let change = PriceChange::between(old_price, new_price);
        if change.percentage_change.abs() >= self.threshold_pct {
            Some(Alert {
                window: AlertWindow::Instant,
                symbol: symbol.to_string(),
                change,
            })
        } else {
            None
        }
    }

    /// Rolling-hour check, deduplicated to at most one alert per symbol per
    /// hour. On a fire the caller must record `now_ms` as the new
    /// last-alert time for the symbol.
    pub fn evaluate_hourly(
        &self,
        symbol: &str,
        hour_ago_price: f64,
        current_price: f64,
        last_alert_ms: Option<i64>,
        now_ms: i64,
    ) -> Option<Alert> {
        let change = PriceChange::between(hour_ago_price, current_price);
        let cooled_down = now_ms - last_alert_ms.unwrap_or(0) >= HOUR_MS;

        if change.percentage_change.abs() >= self.threshold_pct && cooled_down {
            Some(Alert {
                window: AlertWindow::Hourly,
                symbol: symbol.to_string(),
                change,
            })
        } else {
            None
        }
    }
}
