mod config;
pub mod formatting;

pub use config::Config;
pub use formatting::{format_market_cap, format_price, format_signed_pct};
