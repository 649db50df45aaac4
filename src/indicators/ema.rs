use super::Indicator;

/// Exponential moving average seeded with the first observation, so it is
/// defined from the very first update.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            value: None,
        }
    }
}

impl Indicator for Ema {
    type Input = f64;
    type Output = f64;

    fn name(&self) -> &'static str {
        "EMA"
    }

    fn update(&mut self, price: f64) -> f64 {
        let next = match self.value {
            Some(prev) => (price - prev) * self.alpha + prev,
            None => price,
        };
        self.value = Some(next);
        next
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::series;

    #[test]
    fn test_ema_seeded_with_first_value() {
        let mut ema = Ema::new(3);
        assert!(!ema.is_ready());
        // alpha = 0.5
        assert_eq!(series(&mut ema, &[10.0, 20.0, 20.0]), vec![10.0, 15.0, 17.5]);
        assert!(ema.is_ready());
    }
}
