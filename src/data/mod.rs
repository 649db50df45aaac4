pub mod yahoo;
pub mod csv_store;

pub use yahoo::YahooFinanceClient;
pub use csv_store::{CsvSource, RawDataStore};

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::IngestionSettings;
use crate::error::{AnalyticsError, Result};
use crate::types::{OhlcvBar, PriceTable};

/// Anything that can produce daily bars for a symbol.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars with `start <= date < end`, ascending.
    async fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OhlcvBar>>;

    fn name(&self) -> &'static str;

    /// Files on disk answer the same way every time, so retrying them only waits.
    fn is_local(&self) -> bool;
}

/// Calls the source up to `max_retries` times, sleeping a fixed delay
/// between attempts. An empty result counts as a failed attempt. Local
/// sources get a single attempt.
pub async fn fetch_with_retry<S>(
    source: &S,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    settings: &IngestionSettings,
) -> Result<Vec<OhlcvBar>>
where
    S: MarketDataSource + ?Sized,
{
    let attempts = if source.is_local() { 1 } else { settings.max_retries.max(1) };
    let delay = Duration::from_secs(settings.retry_delay_secs);
    let mut last_error = AnalyticsError::NoData {
        symbol: symbol.to_string(),
    };

    for attempt in 1..=attempts {
        match source.fetch_daily(symbol, start, end).await {
            Ok(bars) if !bars.is_empty() => {
                info!(
                    "Fetched {} bars for {} from {} (attempt {}/{})",
                    bars.len(),
                    symbol,
                    source.name(),
                    attempt,
                    attempts
                );
                return Ok(bars);
            }
            Ok(_) => {
                warn!("{} returned no rows for {} (attempt {}/{})", source.name(), symbol, attempt, attempts);
                last_error = AnalyticsError::NoData {
                    symbol: symbol.to_string(),
                };
            }
            Err(e) if e.is_retryable() => {
                warn!("Fetch failed for {} (attempt {}/{}): {}", symbol, attempt, attempts, e);
                last_error = e;
            }
            Err(e) => return Err(e),
        }

        if attempt < attempts && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Err(last_error)
}

/// Fetches with retry and validates the result into a table.
pub async fn load_table<S>(
    source: &S,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    settings: &IngestionSettings,
) -> Result<PriceTable>
where
    S: MarketDataSource + ?Sized,
{
    let bars = fetch_with_retry(source, symbol, start, end, settings).await?;
    PriceTable::new(symbol, bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> IngestionSettings {
        IngestionSettings {
            retry_delay_secs: 0,
            ..IngestionSettings::default()
        }
    }

    fn bars() -> Vec<OhlcvBar> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        vec![
            OhlcvBar::new(date, 10.0, 11.0, 9.5, 10.5, 1_000.0),
            OhlcvBar::new(date.succ_opt().unwrap(), 10.5, 11.5, 10.0, 11.0, 1_200.0),
        ]
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
    }

    fn mock() -> MockMarketDataSource {
        let mut source = MockMarketDataSource::new();
        source.expect_name().return_const("mock");
        source.expect_is_local().return_const(false);
        source
    }

    #[tokio::test]
    async fn test_persistent_empty_result_is_no_data() {
        let mut source = mock();
        source.expect_fetch_daily().times(3).returning(|_, _, _| Ok(Vec::new()));

        let (start, end) = range();
        let err = fetch_with_retry(&source, "TCS.NS", start, end, &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::NoData { ref symbol } if symbol == "TCS.NS"));
    }

    #[tokio::test]
    async fn test_local_source_is_read_once_without_sleeping() {
        let mut source = MockMarketDataSource::new();
        source.expect_name().return_const("file");
        source.expect_is_local().return_const(true);
        source.expect_fetch_daily().times(1).returning(|_, _, _| Ok(Vec::new()));

        let settings = IngestionSettings {
            retry_delay_secs: 3_600,
            ..IngestionSettings::default()
        };
        let (start, end) = range();
        let started = std::time::Instant::now();
        let err = fetch_with_retry(&source, "TCS.NS", start, end, &settings).await.unwrap_err();

        assert!(matches!(err, AnalyticsError::NoData { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_csv_range_without_rows_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, "Date,Open,High,Low,Close,Volume\n2019-05-02,1,1,1,1,10\n").unwrap();

        let settings = IngestionSettings {
            retry_delay_secs: 3_600,
            ..IngestionSettings::default()
        };
        let (start, end) = range();
        let started = std::time::Instant::now();
        let err = load_table(&CsvSource::new(path), "X", start, end, &settings).await.unwrap_err();

        assert!(matches!(err, AnalyticsError::NoData { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let mut source = mock();
        let mut calls = 0;
        source.expect_fetch_daily().times(3).returning(move |_, _, _| {
            calls += 1;
            if calls < 3 {
                Err(AnalyticsError::Fetch("timeout".to_string()))
            } else {
                Ok(bars())
            }
        });

        let (start, end) = range();
        let fetched = fetch_with_retry(&source, "INFY.NS", start, end, &settings()).await.unwrap();
        assert_eq!(fetched, bars());
    }

    #[tokio::test]
    async fn test_last_error_surfaces() {
        let mut source = mock();
        source
            .expect_fetch_daily()
            .times(2)
            .returning(|_, _, _| Err(AnalyticsError::Fetch("503".to_string())));

        let settings = IngestionSettings {
            max_retries: 2,
            ..settings()
        };
        let (start, end) = range();
        let err = fetch_with_retry(&source, "INFY.NS", start, end, &settings).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::Fetch(ref msg) if msg == "503"));
    }

    #[test]
    fn test_non_retryable_error_stops_immediately() {
        let mut source = mock();
        source.expect_fetch_daily().times(1).returning(|_, _, _| {
            Err(AnalyticsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "missing",
            )))
        });

        let (start, end) = range();
        let result = tokio_test::block_on(fetch_with_retry(&source, "X", start, end, &settings()));
        assert!(matches!(result, Err(AnalyticsError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_table_validates_rows() {
        let mut source = mock();
        source.expect_fetch_daily().returning(|_, _, _| {
            let mut rows = bars();
            rows.reverse();
            Ok(rows)
        });

        let (start, end) = range();
        let err = load_table(&source, "TCS.NS", start, end, &settings()).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::UnsortedDates { index: 1, .. }));

        let mut source = mock();
        source.expect_fetch_daily().returning(|_, _, _| Ok(bars()));
        let table = load_table(&source, "TCS.NS", start, end, &settings()).await.unwrap();
        assert_eq!(table.len(), 2);
    }
}
