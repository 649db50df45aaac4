use super::OhlcvBar;
use crate::error::{AnalyticsError, Result};

/// Time-ordered price history for one symbol. Validated once on
/// construction; rows are never reordered or dropped afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl PriceTable {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self> {
        let symbol = symbol.into();
        validate_bars(&symbol, &bars)?;
        Ok(Self { symbol, bars })
    }

    /// Builds a table from closes on consecutive calendar days starting at `start`.
    #[cfg(test)]
    pub fn from_closes(symbol: impl Into<String>, start: chrono::NaiveDate, closes: &[f64]) -> Result<Self> {
        let bars = closes
            .iter()
            .zip(start.iter_days())
            .map(|(close, date)| OhlcvBar::from_close(date, *close))
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

fn validate_bars(symbol: &str, bars: &[OhlcvBar]) -> Result<()> {
    if bars.is_empty() {
        return Err(AnalyticsError::EmptyTable {
            symbol: symbol.to_string(),
        });
    }

    for (index, bar) in bars.iter().enumerate() {
        for (field, value) in bar.fields() {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalyticsError::InvalidField { index, field, value });
            }
        }
        // Returns and drawdown divide by the close.
        if bar.close <= 0.0 {
            return Err(AnalyticsError::InvalidField {
                index,
                field: "Close",
                value: bar.close,
            });
        }
        if index > 0 {
            let previous = bars[index - 1].date;
            if bar.date <= previous {
                return Err(AnalyticsError::UnsortedDates {
                    index,
                    date: bar.date,
                    previous,
                });
            }
        }
    }

    Ok(())
}
