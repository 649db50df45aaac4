use std::collections::VecDeque;

use super::{is_zero_std, mean, sample_std, series, Indicator};

/// Trailing fixed-size window over an optional series. A window containing
/// a missing value is not ready, matching a rolling computation that
/// requires every observation in the window.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<Option<f64>>,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period),
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        self.values.push_back(value);
        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    /// Window contents when full and free of gaps.
    pub fn complete(&self) -> Option<Vec<f64>> {
        if self.period == 0 || self.values.len() < self.period {
            return None;
        }
        self.values.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RollingStats {
    mean: f64,
    std: f64,
}

/// Rolling mean / sample std, plus the z-score of the latest observation.
#[derive(Debug, Clone)]
pub struct RollingZScore {
    window: RollingWindow,
    stats: Option<RollingStats>,
    zscore: Option<f64>,
}

impl RollingZScore {
    pub fn new(period: usize) -> Self {
        Self {
            window: RollingWindow::new(period),
            stats: None,
            zscore: None,
        }
    }

    /// Sample std of the current window, once it is full.
    pub fn std(&self) -> Option<f64> {
        self.stats.map(|s| s.std)
    }
}

impl Indicator for RollingZScore {
    type Input = Option<f64>;
    type Output = Option<f64>;

    fn name(&self) -> &'static str {
        "RollingZScore"
    }

    fn update(&mut self, value: Option<f64>) -> Option<f64> {
        self.window.push(value);

        self.stats = self.window.complete().and_then(|values| {
            Some(RollingStats {
                mean: mean(&values)?,
                std: sample_std(&values)?,
            })
        });

        self.zscore = match (value, self.stats) {
            (Some(v), Some(stats)) if !is_zero_std(stats.std) => Some((v - stats.mean) / stats.std),
            _ => None,
        };

        self.zscore
    }

    fn is_ready(&self) -> bool {
        self.stats.is_some()
    }
}

/// Applies a rolling z-score over a whole series.
pub fn rolling_zscore_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    series(&mut RollingZScore::new(period), values)
}
