use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RiskSettings;
use crate::features::StatisticalFeatures;
use crate::indicators::{is_zero_std, mean, percentile, sample_std};

/// Whole-history risk scalars for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub var_95: Option<f64>,
    pub max_drawdown: f64,
    pub sharpe_ratio: Option<f64>,
    pub risk_score: Option<f64>,
}

impl RiskSummary {
    pub fn compute(features: &StatisticalFeatures, settings: &RiskSettings) -> Self {
        let returns = features.valid_returns();

        let var_95 = value_at_risk(&returns, settings.var_confidence);
        let max_drawdown = features.max_drawdown();
        let sharpe_ratio = sharpe_ratio(&returns, settings.risk_free_rate, settings.trading_days);
        let risk_score = risk_score(var_95, Some(max_drawdown), sharpe_ratio);

        if sharpe_ratio.is_none() {
            warn!(
                returns = returns.len(),
                "Sharpe ratio undefined; risk score left empty"
            );
        }

        debug!(
            var_95 = ?var_95,
            max_drawdown,
            sharpe_ratio = ?sharpe_ratio,
            risk_score = ?risk_score,
            "Risk metrics computed"
        );

        Self {
            var_95,
            max_drawdown,
            sharpe_ratio,
            risk_score,
        }
    }
}

/// Historical VaR: the `(1 - confidence)` percentile of returns.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Option<f64> {
    percentile(returns, (1.0 - confidence) * 100.0)
}

/// Annualised excess return over annualised volatility.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, trading_days: u32) -> Option<f64> {
    let std = sample_std(returns)?;
    if is_zero_std(std) {
        return None;
    }
    let days = f64::from(trading_days);
    let annual_return = mean(returns)? * days;
    Some((annual_return - risk_free_rate) / (std * days.sqrt()))
}

/// `|VaR| * 40 + |MaxDD| * 40 + 20 / (|Sharpe| + 1)`; empty if any input is.
pub fn risk_score(var: Option<f64>, max_drawdown: Option<f64>, sharpe: Option<f64>) -> Option<f64> {
    let (var, max_drawdown, sharpe) = (var?, max_drawdown?, sharpe?);
    Some(var.abs() * 40.0 + max_drawdown.abs() * 40.0 + 20.0 / (sharpe.abs() + 1.0))
}
