use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

/// Error taxonomy for the bot. Every collaborator failure maps onto one of
/// these variants at its call site; cycles log and skip, they never abort.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limit exceeded on the price API")]
    RateLimited,

    #[error("Unknown cryptocurrency: {0}")]
    AssetNotFound(String),

    #[error("Price API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Telegram delivery failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    pub fn internal(msg: impl Into<String>) -> Self {
        BotError::Internal(msg.into())
    }
}
