use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading session of raw price data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar where every price equals `close`.
    #[cfg(test)]
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close, 0.0)
    }

    pub(crate) fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("Open", self.open),
            ("High", self.high),
            ("Low", self.low),
            ("Close", self.close),
            ("Volume", self.volume),
        ]
    }
}

/// Flat CSV layout of the raw ingestion table. `Symbol` is optional on read
/// so plain OHLCV files load too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
    #[serde(rename = "Symbol", default)]
    pub symbol: Option<String>,
}

impl RawRecord {
    pub fn from_bar(bar: &OhlcvBar, symbol: &str) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            symbol: Some(symbol.to_string()),
        }
    }

    pub fn to_bar(&self) -> OhlcvBar {
        OhlcvBar::new(self.date, self.open, self.high, self.low, self.close, self.volume)
    }
}
