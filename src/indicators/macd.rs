use super::{ema::Ema, Indicator};

#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: Ema,
    slow_ema: Ema,
    signal_ema: Ema,
    last: Option<MacdOutput>,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_ema: Ema::new(fast_period),
            slow_ema: Ema::new(slow_period),
            signal_ema: Ema::new(signal_period),
            last: None,
        }
    }
}

impl Indicator for Macd {
    type Input = f64;
    type Output = MacdOutput;

    fn name(&self) -> &'static str {
        "MACD"
    }

    fn update(&mut self, price: f64) -> MacdOutput {
        let macd_line = self.fast_ema.update(price) - self.slow_ema.update(price);
        let signal_line = self.signal_ema.update(macd_line);
        let output = MacdOutput {
            macd_line,
            signal_line,
            histogram: macd_line - signal_line,
        };
        self.last = Some(output);
        output
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::series;

    #[test]
    fn test_macd_defined_from_first_price() {
        let mut macd = Macd::new(12, 26, 9);
        let first = macd.update(100.0);
        assert_eq!(first.macd_line, 0.0);
        assert_eq!(first.signal_line, 0.0);
        assert!(macd.is_ready());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let last = *series(&mut Macd::new(12, 26, 9), &prices).last().unwrap();
        assert!(last.macd_line > 0.0);
        assert!(last.histogram > 0.0);
        assert!(last.signal_line < last.macd_line);
    }
}
