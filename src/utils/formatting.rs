/// Utility functions for formatting display values

/// Format a USD price with 2 to 5 decimal places.
///
/// The width is the number of significant (non-trailing-zero) decimal digits
/// of the shortest decimal rendering, clamped to the 2..=5 range; fixed-point
/// rounding then applies at the chosen width. `1.5` renders as `$1.50`,
/// `0.123456` as `$0.12346`.
pub fn format_price(price: f64) -> String {
    let repr = price.to_string();
    let decimals = repr.split('.').nth(1).unwrap_or("");
    let significant = decimals.trim_end_matches('0').len();
    format!("${:.*}", significant.clamp(2, 5), price)
}

/// Format a percentage change with an explicit sign on gains.
pub fn format_signed_pct(pct: f64) -> String {
    if pct >= 0.0 {
        format!("+{:.2}%", pct)
    } else {
        format!("{:.2}%", pct)
    }
}

/// Format a USD market cap in billions.
pub fn format_market_cap(market_cap: f64) -> String {
    format!("${:.2}B", market_cap / 1e9)
}
