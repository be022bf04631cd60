use crate::functions::traits::WindowIndicator;

use super::volatility::StdDev;

// --- Average ---
pub struct Average;

impl WindowIndicator for Average {
    fn alias(&self) -> &'static str {
        "avg"
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

// --- Minimum ---
pub struct Minimum;

impl WindowIndicator for Minimum {
    fn alias(&self) -> &'static str {
        "min"
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        samples.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }
}

// --- Maximum ---
pub struct Maximum;

impl WindowIndicator for Maximum {
    fn alias(&self) -> &'static str {
        "max"
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        samples.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }
}

// --- Sum ---
pub struct Sum;

impl WindowIndicator for Sum {
    fn alias(&self) -> &'static str {
        "sum"
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        samples.iter().sum()
    }
}

// --- EMA ---
pub struct Ema {
    pub period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl WindowIndicator for Ema {
    fn alias(&self) -> &'static str {
        "ema"
    }

    /// Seeded with the oldest sample; the smoothing factor comes from the
    /// requested period, not from how many samples were present.
    fn calculate(&self, samples: &[f64]) -> f64 {
        let alpha = self.alpha();
        let mut iter = samples.iter();
        let seed = match iter.next() {
            Some(first) => *first,
            None => return 0.0,
        };
        iter.fold(seed, |ema, value| alpha * value + (1.0 - alpha) * ema)
    }
}

// --- Bollinger Bands ---
pub struct BollingerBands {
    pub upper: bool,
}

impl BollingerBands {
    pub const DEVIATIONS: f64 = 2.0;

    pub fn upper() -> Self {
        Self { upper: true }
    }

    pub fn lower() -> Self {
        Self { upper: false }
    }
}

impl WindowIndicator for BollingerBands {
    fn alias(&self) -> &'static str {
        if self.upper {
            "bol_upper"
        } else {
            "bol_lower"
        }
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        let middle = Average.calculate(samples);
        let band = Self::DEVIATIONS * StdDev.calculate(samples);
        if self.upper {
            middle + band
        } else {
            middle - band
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_present_samples() {
        assert_eq!(Average.calculate(&[10.0, 12.0, 14.0]), 12.0);
        assert_eq!(Average.calculate(&[7.0]), 7.0);
        assert_eq!(Average.calculate(&[]), 0.0);
    }

    #[test]
    fn test_min_max_sum() {
        let samples = [3.0, 9.0, 1.0, 4.0];
        assert_eq!(Minimum.calculate(&samples), 1.0);
        assert_eq!(Maximum.calculate(&samples), 9.0);
        assert_eq!(Sum.calculate(&samples), 17.0);
        assert_eq!(Maximum.calculate(&[]), 0.0);
    }

    #[test]
    fn test_ema_seeded_with_oldest() {
        // alpha = 2 / (3 + 1) = 0.5
        let ema = Ema::new(3);
        assert_eq!(ema.calculate(&[10.0]), 10.0);
        assert_eq!(ema.calculate(&[10.0, 20.0]), 15.0);
        assert_eq!(ema.calculate(&[10.0, 20.0, 30.0]), 22.5);
    }

    #[test]
    fn test_bollinger_bands_around_mean() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // mean 5, population standard deviation 2
        assert_eq!(BollingerBands::upper().calculate(&samples), 9.0);
        assert_eq!(BollingerBands::lower().calculate(&samples), 1.0);
        assert_eq!(BollingerBands::upper().calculate(&[6.0]), 6.0);
    }
}
