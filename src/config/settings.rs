use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every tunable of the pipeline. Built once, then passed by reference into
/// each stage; nothing mutates it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub universe: UniverseSettings,
    pub technical: TechnicalSettings,
    pub statistical: StatisticalSettings,
    pub regime: RegimeSettings,
    pub risk: RiskSettings,
    pub anomaly: AnomalySettings,
    pub ingestion: IngestionSettings,
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Technical validation
        let t = &self.technical;
        if t.rsi_period == 0 {
            errors.push("rsi_period must be > 0".to_string());
        }
        if t.macd_fast == 0 || t.macd_signal == 0 {
            errors.push("macd spans must be > 0".to_string());
        }
        if t.macd_fast >= t.macd_slow {
            errors.push("macd_fast must be < macd_slow".to_string());
        }
        if t.bollinger_window < 2 {
            errors.push("bollinger_window must be >= 2".to_string());
        }
        if t.bollinger_std <= 0.0 {
            errors.push("bollinger_std must be > 0".to_string());
        }

        if self.statistical.volatility_window < 2 {
            errors.push("volatility_window must be >= 2".to_string());
        }

        // Regime validation
        if self.regime.n_regimes == 0 {
            errors.push("n_regimes must be >= 1".to_string());
        }
        if self.regime.n_init == 0 || self.regime.max_iter == 0 {
            errors.push("regime n_init and max_iter must be > 0".to_string());
        }

        // Risk validation
        if self.risk.var_confidence <= 0.0 || self.risk.var_confidence >= 1.0 {
            errors.push("var_confidence must be between 0 and 1".to_string());
        }
        if self.risk.trading_days == 0 {
            errors.push("trading_days must be > 0".to_string());
        }

        // Anomaly validation
        let a = &self.anomaly;
        if a.zscore_window < 2 {
            errors.push("zscore_window must be >= 2".to_string());
        }
        if a.zscore_threshold <= 0.0 {
            errors.push("zscore_threshold must be > 0".to_string());
        }
        if a.contamination <= 0.0 || a.contamination > 0.5 {
            errors.push("contamination must be in (0, 0.5]".to_string());
        }
        if a.n_estimators == 0 || a.max_samples < 2 {
            errors.push("isolation forest needs n_estimators > 0 and max_samples >= 2".to_string());
        }

        if self.ingestion.max_retries == 0 {
            errors.push("max_retries must be >= 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSettings {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            symbols: vec![
                "RELIANCE.NS".to_string(),
                "TCS.NS".to_string(),
                "INFY.NS".to_string(),
                "HDFCBANK.NS".to_string(),
            ],
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
}

impl Default for TechnicalSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_std: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalSettings {
    /// Window for `Volatility_20` and `ZScore_Returns`.
    pub volatility_window: usize,
}

impl Default for StatisticalSettings {
    fn default() -> Self {
        Self {
            volatility_window: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeSettings {
    pub n_regimes: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for RegimeSettings {
    fn default() -> Self {
        Self {
            n_regimes: 3,
            seed: 42,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub var_confidence: f64,
    /// Annualized.
    pub risk_free_rate: f64,
    pub trading_days: u32,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            var_confidence: 0.95,
            risk_free_rate: 0.06,
            trading_days: 252,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalySettings {
    pub zscore_window: usize,
    pub zscore_threshold: f64,
    pub contamination: f64,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            zscore_window: 20,
            zscore_threshold: 3.0,
            contamination: 0.03,
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    pub base_url: String,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
    pub raw_data_dir: PathBuf,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            max_retries: 3,
            retry_delay_secs: 2,
            timeout_secs: 30,
            raw_data_dir: PathBuf::from("data/raw/stocks"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.technical.rsi_period, 14);
        assert_eq!(config.regime.n_regimes, 3);
        assert_eq!(config.anomaly.contamination, 0.03);
        assert_eq!(config.risk.risk_free_rate, 0.06);
        assert_eq!(config.universe.symbols.len(), 4);
        assert_eq!(config.universe.start_date.to_string(), "2018-01-01");
    }

    #[test]
    fn test_invalid_config_collects_all_errors() {
        let mut config = AnalyticsConfig::default();
        config.technical.macd_fast = 30;
        config.anomaly.contamination = 0.0;
        config.risk.var_confidence = 1.0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("macd_fast")));
        assert!(errors.iter().any(|e| e.contains("contamination")));
        assert!(errors.iter().any(|e| e.contains("var_confidence")));
    }
}
