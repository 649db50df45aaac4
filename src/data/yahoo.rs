use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::MarketDataSource;
use crate::config::IngestionSettings;
use crate::error::{AnalyticsError, Result};
use crate::types::OhlcvBar;

const USER_AGENT: &str = concat!("equity-intel/", env!("CARGO_PKG_VERSION"));

/// Daily bars from the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new(settings: &IngestionSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            symbol,
            unix_seconds(start),
            unix_seconds(end)
        )
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OhlcvBar>> {
        let url = self.chart_url(symbol, start, end);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Unknown symbols come back as 404 with an error object in the body.
        match serde_json::from_str::<ChartResponse>(&body) {
            Ok(chart) => parse_chart(chart, symbol),
            Err(_) if !status.is_success() => Err(AnalyticsError::Fetch(format!(
                "{} returned HTTP {}",
                symbol, status
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn is_local(&self) -> bool {
        false
    }
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; sessions are dated locally.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn parse_chart(response: ChartResponse, symbol: &str) -> Result<Vec<OhlcvBar>> {
    let chart = response.chart;
    if let Some(error) = chart.error {
        return Err(AnalyticsError::Fetch(format!(
            "{}: {} ({})",
            symbol, error.description, error.code
        )));
    }

    let Some(result) = chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(AnalyticsError::NoData {
            symbol: symbol.to_string(),
        });
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;
    let at = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();

    let mut bars: Vec<OhlcvBar> = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, ts) in result.timestamp.iter().enumerate() {
        // Sessions without a close are holidays or halts.
        let Some(close) = at(&quote.close, i) else {
            skipped += 1;
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|d| d.date_naive()) else {
            skipped += 1;
            continue;
        };
        // A live session can be repeated as the last element.
        if bars.last().is_some_and(|b| b.date >= date) {
            skipped += 1;
            continue;
        }

        bars.push(OhlcvBar::new(
            date,
            at(&quote.open, i).unwrap_or(0.0),
            at(&quote.high, i).unwrap_or(0.0),
            at(&quote.low, i).unwrap_or(0.0),
            close,
            at(&quote.volume, i).unwrap_or(0.0),
        ));
    }

    debug!("Parsed {} bars for {} ({} skipped)", bars.len(), symbol, skipped);
    Ok(bars)
}
