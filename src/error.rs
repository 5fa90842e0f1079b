use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoinwatchError {
    /// Carries no request URL; see the `From` impl below.
    #[error("HTTP error: {0}")]
    HttpError(reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("{service} returned status {status}")]
    UpstreamStatus { service: &'static str, status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// Request URLs may embed credentials (bot token in the path), so they never
// reach an error message.
impl From<reqwest::Error> for CoinwatchError {
    fn from(e: reqwest::Error) -> Self {
        CoinwatchError::HttpError(e.without_url())
    }
}

pub type Result<T> = std::result::Result<T, CoinwatchError>;

/// Failure classes a notification transport may report for a single recipient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    #[error("recipient blocked the bot")]
    Blocked,

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("transport error: {0}")]
    Transport(String),
}
