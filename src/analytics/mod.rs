pub mod report;

pub use report::AnalysisReport;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::features::{self, StatisticalFeatures, TechnicalFeatures};
use crate::ml::{AnomalyDetector, AnomalyFlags, MarketRegime, RegimeAssignment, RegimeDetector};
use crate::risk::RiskSummary;
use crate::types::PriceTable;

/// Runs every analysis stage over one symbol's price table.
pub struct AnalyticsPipeline {
    config: AnalyticsConfig,
}

impl AnalyticsPipeline {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate().map_err(AnalyticsError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// Stages run in dependency order; the table was validated when built.
    pub fn run(&self, table: PriceTable) -> Result<AnalyzedTable> {
        let closes = table.closes();
        info!("Analysing {} ({} sessions)", table.symbol(), closes.len());

        let technical = features::technical::compute(&closes, &self.config.technical);
        let statistical = features::statistical::compute(&closes, &self.config.statistical);
        debug!("Features ready for {}", table.symbol());

        let regimes = RegimeDetector::new(self.config.regime.clone()).detect(&statistical);
        let risk = RiskSummary::compute(&statistical, &self.config.risk);
        let anomalies = AnomalyDetector::new(self.config.anomaly.clone()).detect(&statistical);

        let analyzed = AnalyzedTable {
            table,
            technical,
            statistical,
            regimes,
            risk,
            anomalies,
        };

        info!(
            "✓ {}: latest regime {}, {} anomalies, risk score {}",
            analyzed.symbol(),
            analyzed
                .regimes
                .latest_labelled()
                .map_or("n/a", |r| r.as_str()),
            analyzed.anomalies.flagged_rows().len(),
            analyzed
                .risk
                .risk_score
                .map_or_else(|| "n/a".to_string(), |s| format!("{:.3}", s)),
        );

        Ok(analyzed)
    }
}

/// The raw table plus every stage's output, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedTable {
    pub table: PriceTable,
    pub technical: TechnicalFeatures,
    pub statistical: StatisticalFeatures,
    pub regimes: RegimeAssignment,
    pub risk: RiskSummary,
    pub anomalies: AnomalyFlags,
}

impl AnalyzedTable {
    pub fn symbol(&self) -> &str {
        self.table.symbol()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Flattens to one record per session; risk scalars repeat on every row.
    pub fn rows(&self) -> Vec<AnalyzedRow> {
        let symbol = self.symbol();
        self.table
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| AnalyzedRow {
                date: bar.date,
                symbol: symbol.to_string(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                rsi: self.technical.rsi[i],
                macd: self.technical.macd[i],
                macd_signal: self.technical.macd_signal[i],
                bb_upper: self.technical.bb_upper[i],
                bb_lower: self.technical.bb_lower[i],
                returns: self.statistical.returns[i],
                volatility: self.statistical.volatility[i],
                drawdown: self.statistical.drawdown[i],
                zscore_returns: self.statistical.zscore_returns[i],
                regime: self.regimes.regime[i],
                market_regime: self.regimes.market_regime[i],
                var_95: self.risk.var_95,
                max_drawdown: self.risk.max_drawdown,
                sharpe_ratio: self.risk.sharpe_ratio,
                risk_score: self.risk.risk_score,
                price_anomaly: self.anomalies.price_anomaly[i],
                ml_anomaly: self.anomalies.ml_anomaly[i],
                anomaly_flag: self.anomalies.anomaly_flag[i],
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Symbol")]
    pub symbol: String,
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
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: f64,
    #[serde(rename = "MACD_Signal")]
    pub macd_signal: f64,
    #[serde(rename = "BB_Upper")]
    pub bb_upper: Option<f64>,
    #[serde(rename = "BB_Lower")]
    pub bb_lower: Option<f64>,
    #[serde(rename = "Returns")]
    pub returns: Option<f64>,
    #[serde(rename = "Volatility_20")]
    pub volatility: Option<f64>,
    #[serde(rename = "Drawdown")]
    pub drawdown: f64,
    #[serde(rename = "ZScore_Returns")]
    pub zscore_returns: Option<f64>,
    #[serde(rename = "Regime")]
    pub regime: Option<usize>,
    #[serde(rename = "Market_Regime")]
    pub market_regime: Option<MarketRegime>,
    #[serde(rename = "VaR_95")]
    pub var_95: Option<f64>,
    #[serde(rename = "Max_Drawdown")]
    pub max_drawdown: f64,
    #[serde(rename = "Sharpe_Ratio")]
    pub sharpe_ratio: Option<f64>,
    #[serde(rename = "Risk_Score")]
    pub risk_score: Option<f64>,
    #[serde(rename = "Price_Anomaly")]
    pub price_anomaly: bool,
    #[serde(rename = "ML_Anomaly")]
    pub ml_anomaly: bool,
    #[serde(rename = "Anomaly_Flag")]
    pub anomaly_flag: bool,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two years of a noisy trend with a calm stretch, a sell-off and one
    /// outsized jump.
    pub(crate) fn sample_table() -> PriceTable {
        let mut close: f64 = 100.0;
        let closes: Vec<f64> = (0..500)
            .map(|i| {
                let wobble = ((i * 37) % 11) as f64 / 11.0 - 0.5;
                let drift = match i {
                    0..=199 => 0.0015,
                    200..=299 => -0.004,
                    _ => 0.0005,
                };
                let r = if i == 420 { 0.25 } else { drift + wobble * 0.02 };
                if i > 0 {
                    close *= 1.0 + r;
                }
                close
            })
            .collect();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        PriceTable::from_closes("TEST.NS", start, &closes).unwrap()
    }

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let mut config = AnalyticsConfig::default();
        config.technical.rsi_period = 0;
        assert!(matches!(
            AnalyticsPipeline::new(config),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_every_stage_is_row_aligned() {
        let pipeline = AnalyticsPipeline::new(AnalyticsConfig::default()).unwrap();
        let analyzed = pipeline.run(sample_table()).unwrap();

        assert_eq!(analyzed.len(), 500);
        assert_eq!(analyzed.technical.macd.len(), 500);
        assert_eq!(analyzed.statistical.len(), 500);
        assert_eq!(analyzed.regimes.market_regime.len(), 500);
        assert_eq!(analyzed.anomalies.anomaly_flag.len(), 500);

        let rows = analyzed.rows();
        assert_eq!(rows.len(), 500);
        assert_eq!(rows[0].returns, None);
        assert_eq!(rows[0].regime, None);
        assert!(!rows[0].ml_anomaly);
        assert!(rows.iter().all(|r| r.risk_score == analyzed.risk.risk_score));
        assert!(rows.iter().all(|r| r.drawdown <= 0.0));
        assert!(rows[420].price_anomaly);
    }

    #[test]
    fn test_three_regimes_assigned() {
        let pipeline = AnalyticsPipeline::new(AnalyticsConfig::default()).unwrap();
        let analyzed = pipeline.run(sample_table()).unwrap();

        let labels: Vec<_> = analyzed.regimes.counts().into_iter().map(|(r, _)| r).collect();
        assert_eq!(labels, MarketRegime::ORDERED.to_vec());
        assert!(analyzed.regimes.market_regime[20..].iter().all(|r| r.is_some()));
    }

    #[test]
    fn test_rerun_is_identical() {
        let pipeline = AnalyticsPipeline::new(AnalyticsConfig::default()).unwrap();
        let first = pipeline.run(sample_table()).unwrap();
        let second = pipeline.run(sample_table()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.rows(), second.rows());
    }

    #[test]
    fn test_short_table_degrades_without_fault() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let closes = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0, 106.0, 108.0, 110.0, 109.0];
        let table = PriceTable::from_closes("SHORT", start, &closes).unwrap();
        let analyzed = AnalyticsPipeline::new(AnalyticsConfig::default())
            .unwrap()
            .run(table)
            .unwrap();

        assert!(analyzed.technical.rsi.iter().all(|r| r.is_none()));
        assert!(analyzed.regimes.market_regime.iter().all(|r| r.is_none()));
        assert!(analyzed.anomalies.anomaly_flag.iter().all(|f| !f));
        assert!(analyzed.risk.sharpe_ratio.is_some());
    }
}
