use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analytics::AnalyzedTable;
use crate::error::Result;
use crate::types::{PriceTable, RawRecord};

/// File-name form of a ticker: `RELIANCE.NS` becomes `RELIANCE_NS`.
pub fn sanitize_symbol(symbol: &str) -> String {
    symbol.replace('.', "_")
}

pub fn analyzed_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{}_analyzed.csv", sanitize_symbol(symbol)))
}

/// Writes one row per session with the full analysed column set.
pub fn write_analyzed_csv(path: &Path, analyzed: &AnalyzedTable) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for row in analyzed.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} analysed rows to {}", analyzed.len(), path.display());
    Ok(())
}

pub fn write_raw_csv(path: &Path, table: &PriceTable) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for bar in table.bars() {
        writer.serialize(RawRecord::from_bar(bar, table.symbol()))?;
    }
    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::sample_table;
    use crate::analytics::AnalyticsPipeline;
    use crate::config::AnalyticsConfig;

    const HEADER: &str = "Date,Symbol,Open,High,Low,Close,Volume,RSI,MACD,MACD_Signal,BB_Upper,BB_Lower,\
Returns,Volatility_20,Drawdown,ZScore_Returns,Regime,Market_Regime,VaR_95,Max_Drawdown,\
Sharpe_Ratio,Risk_Score,Price_Anomaly,ML_Anomaly,Anomaly_Flag";

    #[test]
    fn test_analyzed_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let analyzed = AnalyticsPipeline::new(AnalyticsConfig::default())
            .unwrap()
            .run(sample_table())
            .unwrap();

        let path = analyzed_path(&dir.path().join("processed"), analyzed.symbol());
        write_analyzed_csv(&path, &analyzed).unwrap();

        assert!(path.ends_with("TEST_NS_analyzed.csv"));
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(HEADER));

        // first session: no return, no regime, risk scalars still present
        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(first.len(), 25);
        assert_eq!(first[0], "2020-01-01");
        assert_eq!(first[1], "TEST.NS");
        assert_eq!(first[12], "");
        assert_eq!(first[17], "");
        assert!(!first[18].is_empty());
        assert_eq!(first[24], "false");
        assert_eq!(contents.lines().count(), 501);
    }

    #[test]
    fn test_raw_csv_round_trips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let table = sample_table();
        write_raw_csv(&path, &table).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let bars: Vec<_> = reader
            .deserialize::<RawRecord>()
            .map(|r| r.unwrap().to_bar())
            .collect();
        assert_eq!(bars.len(), table.len());
        assert_eq!(bars[0].date, table.bars()[0].date);
    }

    #[test]
    fn test_sanitize_symbol() {
        assert_eq!(sanitize_symbol("HDFCBANK.NS"), "HDFCBANK_NS");
        assert_eq!(sanitize_symbol("AAPL"), "AAPL");
    }
}
