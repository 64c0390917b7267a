//! The univariate normal distribution.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// A normal distribution, parametrised by its mean and standard deviation. A zero standard
/// deviation denotes a point mass at the mean.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Normal {
    pub mean: f64,
    pub stddev: f64,
}
impl Normal {
    pub const fn new(mean: f64, stddev: f64) -> Self {
        Self { mean, stddev }
    }

    #[inline]
    pub fn variance(&self) -> f64 {
        self.stddev * self.stddev
    }

    #[inline]
    pub fn is_point_mass(&self) -> bool {
        self.stddev == 0.0
    }

    /// Probability density at `x`.
    #[inline]
    pub fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.stddev;
        f64::exp(-0.5 * z * z) * INV_SQRT_2PI / self.stddev
    }

    /// Log-density at `x`.
    #[inline]
    pub fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.stddev;
        -0.5 * z * z - self.stddev.ln() - 0.5 * (2.0 * PI).ln()
    }

    /// Maximum-likelihood fit to `samples`; the standard deviation is the population
    /// (not the sample) estimate. Returns `None` if there are no samples.
    pub fn fit(samples: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (mut count, mut mean, mut m2) = (0u64, 0.0, 0.0);
        for sample in samples {
            count += 1;
            let delta = sample - mean;
            mean += delta / count as f64;
            m2 += delta * (sample - mean);
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            mean,
            stddev: (m2 / count as f64).sqrt(),
        })
    }

    /// Widens the distribution by `factor`, capping the resulting standard deviation at `cap`.
    /// The mean is unchanged. A distribution already wider than `cap` is narrowed to `cap`.
    #[inline]
    pub fn fattened(&self, factor: f64, cap: f64) -> Self {
        Self {
            mean: self.mean,
            stddev: f64::min(self.stddev * factor, cap),
        }
    }

    /// The distribution of the sum of independent normals: means add, as do variances.
    pub fn sum_independent<'a>(terms: impl IntoIterator<Item = &'a Normal>) -> Self {
        let (mean, variance) = terms
            .into_iter()
            .fold((0.0, 0.0), |(mean, variance), term| {
                (mean + term.mean, variance + term.variance())
            });
        Self {
            mean,
            stddev: variance.sqrt(),
        }
    }

    /// The distribution of `-X`.
    #[inline]
    pub fn negate(&self) -> Self {
        Self {
            mean: -self.mean,
            stddev: self.stddev,
        }
    }
}

impl From<(f64, f64)> for Normal {
    fn from((mean, stddev): (f64, f64)) -> Self {
        Self { mean, stddev }
    }
}

impl From<Normal> for (f64, f64) {
    fn from(normal: Normal) -> Self {
        (normal.mean, normal.stddev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn pdf_standard() {
        let standard = Normal::new(0.0, 1.0);
        assert_float_relative_eq!(0.3989422804014327, standard.pdf(0.0));
        assert_float_relative_eq!(0.24197072451914337, standard.pdf(1.0));
        assert_float_relative_eq!(0.24197072451914337, standard.pdf(-1.0));
    }

    #[test]
    fn ln_pdf_agrees_with_pdf() {
        let normal = Normal::new(0.3, 0.15);
        for x in [-0.2, 0.0, 0.3, 0.41, 1.0] {
            assert_float_relative_eq!(normal.pdf(x).ln(), normal.ln_pdf(x), 1e-9);
        }
    }

    #[test]
    fn fit_population_stddev() {
        let fitted = Normal::fit([1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_float_absolute_eq!(2.5, fitted.mean, 1e-12);
        assert_float_absolute_eq!(1.25_f64.sqrt(), fitted.stddev, 1e-12);
    }

    #[test]
    fn fit_constant_samples() {
        let fitted = Normal::fit(vec![0.7; 10]).unwrap();
        assert_float_absolute_eq!(0.7, fitted.mean, 1e-12);
        assert_float_absolute_eq!(0.0, fitted.stddev, 1e-12);
    }

    #[test]
    fn fit_empty() {
        assert_eq!(None, Normal::fit(vec![]));
    }

    #[test]
    fn fattened_below_cap() {
        let fattened = Normal::new(0.2, 0.05).fattened(1.05, 0.075);
        assert_eq!(0.2, fattened.mean);
        assert_float_absolute_eq!(0.0525, fattened.stddev, 1e-12);
    }

    #[test]
    fn fattened_capped() {
        let fattened = Normal::new(-0.1, 0.1).fattened(1.05, 0.075);
        assert_eq!(-0.1, fattened.mean);
        assert_eq!(0.075, fattened.stddev);
    }

    #[test]
    fn sum_adds_variances() {
        let sum = Normal::sum_independent(&[Normal::new(1.0, 0.3), Normal::new(0.5, 0.4)]);
        assert_float_absolute_eq!(1.5, sum.mean, 1e-12);
        assert_float_absolute_eq!(0.5, sum.stddev, 1e-12);
    }

    #[test]
    fn sum_of_point_masses() {
        let sum = Normal::sum_independent(&[Normal::new(1.0, 0.0), Normal::new(-0.25, 0.0)]);
        assert_eq!(Normal::new(0.75, 0.0), sum);
        assert!(sum.is_point_mass());
    }
}
