use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("price table for {symbol} has no rows")]
    EmptyTable { symbol: String },

    #[error("dates must be strictly ascending: row {index} ({date}) follows {previous}")]
    UnsortedDates {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("invalid {field} at row {index}: {value}")]
    InvalidField {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("no data returned for symbol {symbol}")]
    NoData { symbol: String },

    #[error("market data fetch failed: {0}")]
    Fetch(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Upstream faults are the ones a retry might cure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalyticsError::NoData { .. } | AnalyticsError::Fetch(_) | AnalyticsError::Http(_)
        )
    }
}
