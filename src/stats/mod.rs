//! Statistical calculations over measurement samples
//!
//! Every function here is pure and rejects an empty sample set with
//! [`AppError::InvalidInput`]. Quantiles use linear interpolation between
//! order statistics, so `quantile(xs, 0.5)` equals `median(xs)`.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Read-only summary view over a sorted, non-empty sample collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Samples in ascending order
    sorted: Vec<f64>,
}

impl SummaryStatistics {
    /// Build a summary from raw samples in any order
    pub fn new(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(AppError::invalid_input("No samples provided for statistics calculation"));
        }
        if let Some(bad) = samples.iter().find(|x| !x.is_finite()) {
            return Err(AppError::invalid_input(format!("Sample value is not finite: {}", bad)));
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Ok(Self { sorted })
    }

    /// Number of samples
    pub fn count(&self) -> usize {
        self.sorted.len()
    }

    pub fn min(&self) -> f64 {
        self.sorted[0]
    }

    pub fn max(&self) -> f64 {
        self.sorted[self.sorted.len() - 1]
    }

    pub fn average(&self) -> f64 {
        self.sorted.iter().sum::<f64>() / self.sorted.len() as f64
    }

    pub fn median(&self) -> f64 {
        let n = self.sorted.len();
        let mid = n / 2;
        if n % 2 == 1 {
            self.sorted[mid]
        } else {
            (self.sorted[mid - 1] + self.sorted[mid]) / 2.0
        }
    }

    /// Linearly interpolated quantile for `q` in `[0, 1]`
    pub fn quantile(&self, q: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&q) {
            return Err(AppError::invalid_input(format!("Quantile must be within [0, 1], got {}", q)));
        }

        let index = q * (self.sorted.len() - 1) as f64;
        let lower = index.floor() as usize;
        let upper = index.ceil() as usize;
        if lower == upper {
            return Ok(self.sorted[lower]);
        }

        let weight = index - lower as f64;
        Ok(self.sorted[lower] + (self.sorted[upper] - self.sorted[lower]) * weight)
    }

    /// Samples in ascending order
    pub fn sorted_samples(&self) -> &[f64] {
        &self.sorted
    }
}

/// Arithmetic mean of the samples
pub fn average(samples: &[f64]) -> Result<f64> {
    SummaryStatistics::new(samples).map(|s| s.average())
}

/// Median of the samples (mean of the two middle values for even counts)
pub fn median(samples: &[f64]) -> Result<f64> {
    SummaryStatistics::new(samples).map(|s| s.median())
}

/// Linearly interpolated quantile of the samples
pub fn quantile(samples: &[f64], q: f64) -> Result<f64> {
    SummaryStatistics::new(samples)?.quantile(q)
}

pub fn min(samples: &[f64]) -> Result<f64> {
    SummaryStatistics::new(samples).map(|s| s.min())
}

pub fn max(samples: &[f64]) -> Result<f64> {
    SummaryStatistics::new(samples).map(|s| s.max())
}

/// Mean absolute difference between consecutive samples, in measurement order
pub fn jitter(samples: &[f64]) -> Result<f64> {
    if samples.len() < 2 {
        return Err(AppError::invalid_input(format!(
            "Jitter requires at least 2 samples, got {}",
            samples.len()
        )));
    }

    let deltas: Vec<f64> = samples
        .windows(2)
        .map(|pair| (pair[0] - pair[1]).abs())
        .collect();
    average(&deltas)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_close(median(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 3.0);
        assert_close(median(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
        assert_close(median(&[5.0, 1.0, 4.0, 2.0, 3.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_close(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.9).unwrap(), 4.6);
        assert_close(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5).unwrap(), 3.0);
        assert_close(quantile(&[10.0, 20.0], 0.25).unwrap(), 12.5);
    }

    #[test]
    fn test_quantile_out_of_range() {
        let result = quantile(&[1.0, 2.0], 1.5);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = quantile(&[1.0, 2.0], f64::NAN);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_average() {
        assert_close(average(&[10.0, 20.0, 30.0]).unwrap(), 20.0);
    }

    #[test]
    fn test_empty_input_is_invalid() {
        assert!(matches!(average(&[]), Err(AppError::InvalidInput(_))));
        assert!(matches!(median(&[]), Err(AppError::InvalidInput(_))));
        assert!(matches!(quantile(&[], 0.5), Err(AppError::InvalidInput(_))));
        assert!(matches!(min(&[]), Err(AppError::InvalidInput(_))));
        assert!(matches!(max(&[]), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_non_finite_input_is_invalid() {
        assert!(matches!(average(&[1.0, f64::NAN]), Err(AppError::InvalidInput(_))));
        assert!(matches!(median(&[f64::INFINITY]), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_single_sample() {
        let summary = SummaryStatistics::new(&[42.0]).unwrap();
        assert_eq!(summary.count(), 1);
        assert_close(summary.min(), 42.0);
        assert_close(summary.max(), 42.0);
        assert_close(summary.median(), 42.0);
        assert_close(summary.quantile(0.9).unwrap(), 42.0);
    }

    #[test]
    fn test_summary_is_sorted_view() {
        let summary = SummaryStatistics::new(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(summary.sorted_samples(), &[1.0, 2.0, 3.0]);
        assert_close(summary.min(), 1.0);
        assert_close(summary.max(), 3.0);
    }

    #[test]
    fn test_jitter() {
        assert_close(jitter(&[10.0, 12.0, 9.0, 9.0]).unwrap(), (2.0 + 3.0 + 0.0) / 3.0);
        assert!(matches!(jitter(&[10.0]), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_median_robust_to_outlier() {
        let mut samples = vec![15.0; 19];
        samples.push(200.0);

        let summary = SummaryStatistics::new(&samples).unwrap();
        assert_close(summary.median(), 15.0);
        assert_close(summary.max(), 200.0);
        assert!(summary.average() > 15.0);
        assert_close(summary.average(), (15.0 * 19.0 + 200.0) / 20.0);
    }
}
