use crate::functions::traits::WindowIndicator;

/// Neutral RSI reading when there is no movement to measure.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Newest minus oldest sample. Callers extend the window one day back so a
/// period of `n` spans `n` changes.
pub struct Momentum;

impl WindowIndicator for Momentum {
    fn alias(&self) -> &'static str {
        "momentum"
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        match (samples.first(), samples.last()) {
            (Some(oldest), Some(newest)) if samples.len() > 1 => newest - oldest,
            _ => 0.0,
        }
    }
}

/// Relative strength index over the changes between successive samples.
pub struct Rsi;

impl WindowIndicator for Rsi {
    fn alias(&self) -> &'static str {
        "rsi"
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        if samples.len() < 2 {
            return NEUTRAL_RSI;
        }

        let (gain, loss) = samples
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold((0.0, 0.0), |(gain, loss), change| {
                if change > 0.0 {
                    (gain + change, loss)
                } else {
                    (gain, loss - change)
                }
            });

        if loss == 0.0 {
            return if gain == 0.0 { NEUTRAL_RSI } else { 100.0 };
        }
        let rs = gain / loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_momentum() {
        assert_eq!(Momentum.calculate(&[10.0, 12.0, 15.0]), 5.0);
        assert_eq!(Momentum.calculate(&[10.0]), 0.0);
        assert_eq!(Momentum.calculate(&[]), 0.0);
    }

    #[test]
    fn test_rsi_bounds() {
        assert_eq!(Rsi.calculate(&[1.0, 2.0, 3.0]), 100.0);
        assert_eq!(Rsi.calculate(&[3.0, 2.0, 1.0]), 0.0);
        assert_eq!(Rsi.calculate(&[2.0, 2.0, 2.0]), NEUTRAL_RSI);
        assert_eq!(Rsi.calculate(&[2.0]), NEUTRAL_RSI);
        assert_eq!(Rsi.calculate(&[]), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // gains 2, losses 2
        assert_eq!(Rsi.calculate(&[10.0, 12.0, 10.0]), 50.0);
        // gains 3, losses 1: rs 3, rsi 75
        assert_eq!(Rsi.calculate(&[10.0, 13.0, 12.0]), 75.0);
    }
}
