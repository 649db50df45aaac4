use super::{mean, Indicator, RollingWindow};

/// Relative strength index over simple rolling means of gains and losses.
#[derive(Debug, Clone)]
pub struct Rsi {
    prev_price: Option<f64>,
    gains: RollingWindow,
    losses: RollingWindow,
    value: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            prev_price: None,
            gains: RollingWindow::new(period),
            losses: RollingWindow::new(period),
            value: None,
        }
    }
}

/// No movement at all carries no signal; no losses saturates at 100.
fn calculate_rsi(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return None;
        }
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

impl Indicator for Rsi {
    type Input = f64;
    type Output = Option<f64>;

    fn name(&self) -> &'static str {
        "RSI"
    }

    fn update(&mut self, price: f64) -> Option<f64> {
        let change = self.prev_price.map(|prev| price - prev);
        self.gains.push(change.map(|c| c.max(0.0)));
        self.losses.push(change.map(|c| (-c).max(0.0)));
        self.prev_price = Some(price);

        self.value = match (self.gains.complete(), self.losses.complete()) {
            (Some(gains), Some(losses)) => mean(&gains)
                .zip(mean(&losses))
                .and_then(|(avg_gain, avg_loss)| calculate_rsi(avg_gain, avg_loss)),
            _ => None,
        };
        self.value
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}
