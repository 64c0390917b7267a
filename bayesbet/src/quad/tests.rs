use std::f64::consts::PI;

use assert_float_eq::*;

use super::*;
use crate::normal::Normal;

#[test]
fn polynomial_exact() {
    let integral = integrate(|x| x * x, 0.0, 1.0, &QuadConfig::default());
    assert_float_absolute_eq!(1.0 / 3.0, integral.value, 1e-14);
    assert_eq!(QuadConfig::default().initial_subdivisions + 1, integral.subintervals);
}

#[test]
fn reversed_bounds_negate() {
    let forward = integrate(f64::exp, 0.0, 2.0, &QuadConfig::default());
    let reverse = integrate(f64::exp, 2.0, 0.0, &QuadConfig::default());
    assert_float_absolute_eq!(2.0_f64.exp() - 1.0, forward.value, 1e-12);
    assert_float_absolute_eq!(-forward.value, reverse.value, 1e-12);
}

#[test]
fn empty_interval() {
    let integral = integrate(|_| panic!("should not be evaluated"), 1.5, 1.5, &QuadConfig::default());
    assert_eq!(0.0, integral.value);
    assert_eq!(0, integral.subintervals);
}

#[test]
fn narrow_normal_density() {
    let normal = Normal::new(1.2345, 0.02);
    let integral = integrate(|x| normal.pdf(x), -3.0, 5.0, &QuadConfig::default());
    assert_float_absolute_eq!(1.0, integral.value, 1e-8);
}

#[test]
fn oscillatory_bisects() {
    let config = QuadConfig {
        initial_subdivisions: 1,
        ..QuadConfig::default()
    };
    let integral = integrate(|x| (20.0 * x).sin(), 0.0, PI, &config);
    assert_float_absolute_eq!((1.0 - (20.0 * PI).cos()) / 20.0, integral.value, 1e-8);
    assert!(integral.subintervals > 1);
}

#[test]
fn refinement_stops_at_limit() {
    let config = QuadConfig {
        limit: 2,
        initial_subdivisions: 2,
        ..QuadConfig::default()
    };
    let integral = integrate(|x| x * x, 0.0, 1.0, &config);
    assert_eq!(2, integral.subintervals);
    assert_float_absolute_eq!(1.0 / 3.0, integral.value, 1e-14);
}

#[test]
fn limit_respected() {
    let config = QuadConfig {
        abs_tol: 1e-300,
        rel_tol: 0.0,
        limit: 12,
        initial_subdivisions: 4,
    };
    let integral = integrate(|x| x.abs().sqrt(), -1.0, 1.0, &config);
    assert_eq!(12, integral.subintervals);
    assert_float_absolute_eq!(4.0 / 3.0, integral.value, 1e-4);
}

#[test]
fn separable_2d() {
    let integral = integrate_2d(|x, y| x * y.exp(), 0.0..2.0, 0.0..1.0, &QuadConfig::default());
    assert_float_absolute_eq!(2.0 * (1.0_f64.exp() - 1.0), integral.value, 1e-12);
}

#[test]
fn bivariate_normal_2d() {
    let (h, a) = (Normal::new(1.0, 0.1), Normal::new(0.8, 0.15));
    let integral = integrate_2d(
        |x, y| h.pdf(x) * a.pdf(y),
        -3.0..5.0,
        -3.0..5.0,
        &QuadConfig::default(),
    );
    assert_float_absolute_eq!(1.0, integral.value, 1e-7);
}

#[test]
fn config_validation() {
    assert!(QuadConfig::default().validate().is_ok());
    assert_eq!(
        "at least one of the tolerances must be positive",
        QuadConfig {
            abs_tol: 0.0,
            rel_tol: 0.0,
            ..QuadConfig::default()
        }
        .validate()
        .unwrap_err()
        .to_string()
    );
    assert!(QuadConfig {
        limit: 4,
        initial_subdivisions: 8,
        ..QuadConfig::default()
    }
    .validate()
    .is_err());
}
