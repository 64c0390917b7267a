use assert_float_eq::*;

use super::*;
use crate::normal::Normal;

/// Independent normals along each coordinate.
struct Isotropic(Vec<Normal>);

impl LogDensity for Isotropic {
    fn dimensions(&self) -> usize {
        self.0.len()
    }

    fn evaluate(&self, theta: &[f64], gradient: &mut [f64]) -> f64 {
        let mut log_p = 0.0;
        for ((normal, &x), g) in self.0.iter().zip(theta).zip(gradient.iter_mut()) {
            log_p += normal.ln_pdf(x);
            *g = -(x - normal.mean) / normal.variance();
        }
        log_p
    }
}

/// Bivariate normal with correlation `rho` between the coordinates.
struct Correlated {
    x: Normal,
    y: Normal,
    rho: f64,
}

impl LogDensity for Correlated {
    fn dimensions(&self) -> usize {
        2
    }

    fn evaluate(&self, theta: &[f64], gradient: &mut [f64]) -> f64 {
        let zx = (theta[0] - self.x.mean) / self.x.stddev;
        let zy = (theta[1] - self.y.mean) / self.y.stddev;
        let det = 1.0 - self.rho * self.rho;
        gradient[0] = -(zx - self.rho * zy) / (det * self.x.stddev);
        gradient[1] = -(zy - self.rho * zx) / (det * self.y.stddev);
        -0.5 * (zx * zx - 2.0 * self.rho * zx * zy + zy * zy) / det
    }
}

/// Log density that is undefined away from the positive orthant.
struct PositiveOnly;

impl LogDensity for PositiveOnly {
    fn dimensions(&self) -> usize {
        1
    }

    fn evaluate(&self, theta: &[f64], gradient: &mut [f64]) -> f64 {
        gradient[0] = 1.0 / theta[0] - 1.0;
        theta[0].ln() - theta[0]
    }
}

fn test_config() -> HmcConfig {
    HmcConfig {
        samples: 2000,
        tune: 1000,
        chains: 3,
        seed: 42,
        ..HmcConfig::default()
    }
}

#[test]
fn recovers_independent_normals() {
    let target = Isotropic(vec![Normal::new(1.0, 2.0), Normal::new(-1.0, 0.5)]);
    let trace = sample(&test_config(), &target, &[0.0, 0.0], &[1.0, 1.0]).unwrap();
    assert_eq!(2, trace.dimensions());
    assert_eq!(6000, trace.len());
    assert_eq!(3, trace.chains.len());

    for (dimension, expected) in target.0.iter().enumerate() {
        let fitted = Normal::fit(trace.column(dimension)).unwrap();
        assert_float_absolute_eq!(expected.mean, fitted.mean, 0.15 * expected.stddev);
        assert_float_relative_eq!(expected.stddev, fitted.stddev, 0.1);
    }
    for chain in &trace.chains {
        assert!(chain.acceptance_rate > 0.5, "{chain:?}");
        assert!(chain.step_size > 0.0, "{chain:?}");
    }
}

#[test]
fn recovers_correlated_normals() {
    let target = Correlated {
        x: Normal::new(0.5, 0.2),
        y: Normal::new(-1.5, 0.6),
        rho: 0.8,
    };
    let trace = sample(&test_config(), &target, &[0.0, 0.0], &[0.2, 0.6]).unwrap();
    let xs = trace.column(0).collect::<Vec<_>>();
    let ys = trace.column(1).collect::<Vec<_>>();
    let fitted_x = Normal::fit(xs.iter().copied()).unwrap();
    let fitted_y = Normal::fit(ys.iter().copied()).unwrap();
    assert_float_absolute_eq!(0.5, fitted_x.mean, 0.15 * 0.2);
    assert_float_absolute_eq!(-1.5, fitted_y.mean, 0.15 * 0.6);
    assert_float_relative_eq!(0.2, fitted_x.stddev, 0.1);
    assert_float_relative_eq!(0.6, fitted_y.stddev, 0.1);

    let covariance = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - fitted_x.mean) * (y - fitted_y.mean))
        .sum::<f64>()
        / xs.len() as f64;
    let correlation = covariance / (fitted_x.stddev * fitted_y.stddev);
    assert_float_absolute_eq!(0.8, correlation, 0.05);
}

#[test]
fn reproducible_under_seed() {
    let target = Isotropic(vec![Normal::new(0.3, 0.1); 4]);
    let config = HmcConfig {
        samples: 50,
        tune: 50,
        ..test_config()
    };
    let first = sample(&config, &target, &[0.3; 4], &[0.1; 4]).unwrap();
    let second = sample(&config, &target, &[0.3; 4], &[0.1; 4]).unwrap();
    assert_eq!(first.draws, second.draws);

    let reseeded = sample(&HmcConfig { seed: 43, ..config }, &target, &[0.3; 4], &[0.1; 4]).unwrap();
    assert_ne!(first.draws, reseeded.draws);
}

#[test]
fn column_follows_draws() {
    let target = Isotropic(vec![Normal::new(0.0, 1.0); 3]);
    let config = HmcConfig {
        samples: 10,
        tune: 0,
        chains: 2,
        ..test_config()
    };
    let trace = sample(&config, &target, &[0.0; 3], &[1.0; 3]).unwrap();
    assert_eq!(20, trace.len());
    let column = trace.column(2).collect::<Vec<_>>();
    for (index, value) in column.into_iter().enumerate() {
        assert_eq!(trace.draw(index)[2], value);
    }
}

#[test]
fn rejects_non_finite_proposals() {
    let config = HmcConfig {
        samples: 1000,
        tune: 500,
        chains: 1,
        ..test_config()
    };
    let trace = sample(&config, &PositiveOnly, &[1.0], &[1.0]).unwrap();
    assert!(trace.column(0).all(|x| x > 0.0));
    // Gamma(2, 1) has mean 2
    let fitted = Normal::fit(trace.column(0)).unwrap();
    assert_float_absolute_eq!(2.0, fitted.mean, 0.3);
}

#[test]
fn dimension_mismatch() {
    let target = Isotropic(vec![Normal::new(0.0, 1.0); 2]);
    let err = sample(&test_config(), &target, &[0.0], &[1.0, 1.0]).unwrap_err();
    assert_eq!("expected 2 dimensions, got 1 in init", err.to_string());
}

#[test]
fn invalid_scale() {
    let target = Isotropic(vec![Normal::new(0.0, 1.0); 2]);
    let err = sample(&test_config(), &target, &[0.0, 0.0], &[1.0, 0.0]).unwrap_err();
    assert_eq!("scale at dimension 1 must be positive and finite", err.to_string());
}

#[test]
fn non_finite_initial() {
    let err = sample(&test_config(), &PositiveOnly, &[-1.0], &[1.0]).unwrap_err();
    assert!(matches!(err, SampleError::NonFiniteInitial(_)), "{err:?}");
}

#[test]
fn config_validation() {
    assert!(HmcConfig::default().validate().is_ok());
    let err = sample(
        &HmcConfig {
            target_acceptance: 1.0,
            ..test_config()
        },
        &PositiveOnly,
        &[1.0],
        &[1.0],
    )
    .unwrap_err();
    assert_eq!(
        "invalid sampler config: target acceptance must lie in (0, 1)",
        err.to_string()
    );
}

#[test]
fn trace_from_draws() {
    let trace = Trace::new(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![]);
    assert_eq!(3, trace.len());
    assert_eq!(&[3.0, 4.0], trace.draw(1));
    assert_eq!(vec![2.0, 4.0, 6.0], trace.column(1).collect::<Vec<_>>());
}

#[test]
#[should_panic(expected = "draws must be a multiple of 2")]
fn trace_from_ragged_draws() {
    Trace::new(2, vec![1.0, 2.0, 3.0], vec![]);
}
