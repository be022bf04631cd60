use crate::functions::traits::WindowIndicator;

use super::trend::Average;

/// Population standard deviation.
pub struct StdDev;

impl WindowIndicator for StdDev {
    fn alias(&self) -> &'static str {
        "stddev"
    }

    fn calculate(&self, samples: &[f64]) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }
        let mean = Average.calculate(samples);
        let variance = samples
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / samples.len() as f64;
        variance.sqrt()
    }
}

/// Pearson correlation of paired samples. Fewer than two pairs, or a series
/// without variation, correlate to 0.
pub fn correlation(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (covariance, var_x, var_y) = pairs.iter().fold((0.0, 0.0, 0.0), |(cov, vx, vy), (x, y)| {
        let dx = x - mean_x;
        let dy = y - mean_y;
        (cov + dx * dy, vx + dx * dx, vy + dy * dy)
    });

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        covariance / denominator
    }
}
