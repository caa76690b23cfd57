/// How often the monitor polls tracked coins (5 minutes).
pub const PRICE_CHECK_INTERVAL_MS: u64 = 300_000;

/// Percentage move that triggers an alert.
pub const ALERT_THRESHOLD_PCT: f64 = 5.0;

pub const HOUR_MS: i64 = 3_600_000;
pub const DAY_MS: i64 = 86_400_000;

/// Coins tracked when TRACKED_COINS is not configured.
pub const DEFAULT_TRACKED_COINS: [&str; 3] = ["bitcoin", "ethereum", "dogecoin"];

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Explicit timeout on every outbound API call.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Default count for /top when no number is given.
pub const DEFAULT_TOP_COUNT: usize = 10;

/// Page size requested from the markets endpoint before truncating to N.
pub const MARKETS_PAGE_SIZE: u32 = 250;
