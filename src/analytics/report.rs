use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::AnalyzedTable;
use crate::ml::regime::ClusterProfile;
use crate::ml::MarketRegime;

/// Console and JSON summary of one analysed symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sessions: usize,
    pub last_close: f64,
    pub latest_regime: Option<MarketRegime>,
    pub var_95: Option<f64>,
    pub max_drawdown: f64,
    pub sharpe_ratio: Option<f64>,
    pub risk_score: Option<f64>,
    pub regime_counts: Vec<(MarketRegime, usize)>,
    /// Clusters in ranked order, including any left unlabelled.
    pub regime_profiles: Vec<ClusterProfile>,
    pub latest_indicators: LatestIndicators,
    pub anomalies: Vec<AnomalyEvent>,
}

/// Indicator readings on the final session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestIndicators {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl LatestIndicators {
    fn from_table(analyzed: &AnalyzedTable) -> Self {
        let technical = &analyzed.technical;
        Self {
            rsi: technical.rsi.last().copied().flatten(),
            macd: technical.macd.last().copied(),
            macd_signal: technical.macd_signal.last().copied(),
            macd_histogram: technical.macd_histogram.last().copied(),
            bb_upper: technical.bb_upper.last().copied().flatten(),
            bb_middle: technical.bb_middle.last().copied().flatten(),
            bb_lower: technical.bb_lower.last().copied().flatten(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub date: NaiveDate,
    pub close: f64,
    pub returns: Option<f64>,
    pub price_anomaly: bool,
    pub ml_anomaly: bool,
    pub ml_score: Option<f64>,
}

impl AnalysisReport {
    pub fn from_table(analyzed: &AnalyzedTable) -> Self {
        let bars = analyzed.table.bars();
        let first = bars.first();
        let last = bars.last();

        let anomalies = analyzed
            .anomalies
            .flagged_rows()
            .into_iter()
            .map(|i| AnomalyEvent {
                date: bars[i].date,
                close: bars[i].close,
                returns: analyzed.statistical.returns[i],
                price_anomaly: analyzed.anomalies.price_anomaly[i],
                ml_anomaly: analyzed.anomalies.ml_anomaly[i],
                ml_score: analyzed.anomalies.ml_score[i],
            })
            .collect();

        Self {
            symbol: analyzed.symbol().to_string(),
            start_date: first.map(|b| b.date).unwrap_or_default(),
            end_date: last.map(|b| b.date).unwrap_or_default(),
            sessions: analyzed.len(),
            last_close: last.map_or(0.0, |b| b.close),
            latest_regime: analyzed.regimes.latest_labelled(),
            var_95: analyzed.risk.var_95,
            max_drawdown: analyzed.risk.max_drawdown,
            sharpe_ratio: analyzed.risk.sharpe_ratio,
            risk_score: analyzed.risk.risk_score,
            regime_counts: analyzed.regimes.counts(),
            regime_profiles: analyzed.regimes.profiles.clone(),
            latest_indicators: LatestIndicators::from_table(analyzed),
            anomalies,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                 ANALYSIS: {}", self.symbol);
        println!("{}", "=".repeat(60));
        println!("Period:             {} to {} ({} sessions)", self.start_date, self.end_date, self.sessions);
        println!("Last Close:         {:.2}", self.last_close);
        println!("Market Regime:      {}", display_regime(self.latest_regime));
        println!("{}", "-".repeat(60));
        let ind = &self.latest_indicators;
        println!("INDICATORS");
        println!("  RSI:                {}", display_num(ind.rsi));
        println!(
            "  MACD:               {} (signal {}, histogram {})",
            display_num(ind.macd),
            display_num(ind.macd_signal),
            display_num(ind.macd_histogram)
        );
        println!(
            "  Bollinger:          {} / {} / {}",
            display_num(ind.bb_lower),
            display_num(ind.bb_middle),
            display_num(ind.bb_upper)
        );
        println!("{}", "-".repeat(60));
        println!("RISK");
        println!("  VaR (95%):          {}", display_pct(self.var_95));
        println!("  Max Drawdown:       {:.2}%", self.max_drawdown * 100.0);
        println!("  Sharpe Ratio:       {}", display_num(self.sharpe_ratio));
        println!("  Risk Score:         {}", display_num(self.risk_score));
        println!("{}", "-".repeat(60));
        println!("REGIMES");
        if self.regime_counts.is_empty() {
            println!("  (not enough history)");
        }
        for (regime, count) in &self.regime_counts {
            println!("  {:<10} {} sessions", regime, count);
        }
        for profile in &self.regime_profiles {
            println!(
                "  cluster {} -> {:<8} mean return {:>8}  mean vol {:>8}  ({} rows)",
                profile.cluster,
                display_regime(profile.label),
                display_pct(Some(profile.mean_return)),
                display_pct(Some(profile.mean_volatility)),
                profile.size
            );
        }
        println!("{}", "-".repeat(60));
        println!("ANOMALIES ({})", self.anomalies.len());
        for event in &self.anomalies {
            let source = match (event.price_anomaly, event.ml_anomaly) {
                (true, true) => "z-score + forest",
                (true, false) => "z-score",
                _ => "forest",
            };
            println!(
                "  {}  close {:>10.2}  return {:>8}  score {:>5}  [{}]",
                event.date,
                event.close,
                display_pct(event.returns),
                display_num(event.ml_score),
                source
            );
        }
        println!("{}", "=".repeat(60));
    }
}

fn display_regime(regime: Option<MarketRegime>) -> String {
    regime.map_or_else(|| "n/a".to_string(), |r| r.to_string())
}

fn display_num(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn display_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}
