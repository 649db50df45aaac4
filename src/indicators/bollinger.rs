use super::{mean, sample_std, Indicator, RollingWindow};

#[derive(Debug, Clone)]
pub struct BollingerBands {
    std_dev_multiplier: f64,
    prices: RollingWindow,
    last: Option<BollingerOutput>,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            std_dev_multiplier,
            prices: RollingWindow::new(period),
            last: None,
        }
    }
}

impl Indicator for BollingerBands {
    type Input = f64;
    type Output = Option<BollingerOutput>;

    fn name(&self) -> &'static str {
        "BollingerBands"
    }

    fn update(&mut self, price: f64) -> Option<BollingerOutput> {
        self.prices.push(Some(price));

        self.last = self.prices.complete().and_then(|window| {
            let middle = mean(&window)?;
            let deviation = sample_std(&window)? * self.std_dev_multiplier;
            Some(BollingerOutput {
                upper: middle + deviation,
                middle,
                lower: middle - deviation,
            })
        });
        self.last
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}
