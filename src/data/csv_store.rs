use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info};

use super::MarketDataSource;
use crate::error::Result;
use crate::export::{sanitize_symbol, write_raw_csv};
use crate::types::{OhlcvBar, PriceTable, RawRecord};

/// Reads bars from a flat `Date,Open,High,Low,Close,Volume[,Symbol]` file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read_records(&self) -> Result<Vec<RawRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader.deserialize().collect::<std::result::Result<Vec<RawRecord>, _>>()?;
        debug!("Read {} rows from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Distinct `Symbol` values in order of first appearance.
    pub fn symbols(&self) -> Result<Vec<String>> {
        let mut symbols: Vec<String> = Vec::new();
        for symbol in self.read_records()?.into_iter().filter_map(|r| r.symbol) {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }
}

#[async_trait]
impl MarketDataSource for CsvSource {
    /// Rows tagged with another symbol are skipped; untagged rows are kept.
    async fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OhlcvBar>> {
        let bars = self
            .read_records()?
            .into_iter()
            .filter(|r| r.symbol.as_deref().map_or(true, |s| s.eq_ignore_ascii_case(symbol)))
            .filter(|r| r.date >= start && r.date < end)
            .map(|r| r.to_bar())
            .collect();
        Ok(bars)
    }

    fn name(&self) -> &'static str {
        "csv"
    }

    fn is_local(&self) -> bool {
        true
    }
}

/// Raw ingestion snapshots, one file per symbol.
#[derive(Debug, Clone)]
pub struct RawDataStore {
    dir: PathBuf,
}

impl RawDataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}_raw.csv", sanitize_symbol(symbol)))
    }

    pub fn save(&self, table: &PriceTable) -> Result<PathBuf> {
        let path = self.path_for(table.symbol());
        write_raw_csv(&path, table)?;
        info!("Saved raw data: {}", path.display());
        Ok(path)
    }
}

/// Serves previously saved snapshots, so an analysis can rerun offline.
#[async_trait]
impl MarketDataSource for RawDataStore {
    async fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OhlcvBar>> {
        CsvSource::new(self.path_for(symbol)).fetch_daily(symbol, start, end).await
    }

    fn name(&self) -> &'static str {
        "raw-store"
    }

    fn is_local(&self) -> bool {
        true
    }
}
