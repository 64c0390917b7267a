//! Poisson processes whose rates are log-normally distributed.
//!
//! A log-rate is a [`Normal`] over `ln λ`. Expectations over it are taken by numerical
//! integration across [`LOG_RATE_SUPPORT`], which truncates the log-rate to rates between
//! `e^-3` and `e^5`. The integration is further confined to [`TAIL_STDDEVS`] standard deviations
//! either side of the mean, and split at the mean, so that narrow distributions are resolved.
//! Point-mass log-rates are evaluated directly at their mean.

use std::ops::Range;

use crate::normal::Normal;
use crate::quad::{integrate, integrate_2d, QuadConfig};

pub const LOG_RATE_SUPPORT: Range<f64> = -3.0..5.0;

/// Distance from the mean, in standard deviations, beyond which the log-rate density is
/// neglected. The density there is below `e^-72` of its peak.
pub const TAIL_STDDEVS: f64 = 12.0;

/// Subranges of the support carrying the mass of `log_rate`, split at its mean.
fn pieces(log_rate: &Normal) -> Vec<Range<f64>> {
    let reach = TAIL_STDDEVS * log_rate.stddev;
    let start = f64::max(LOG_RATE_SUPPORT.start, log_rate.mean - reach);
    let end = f64::min(LOG_RATE_SUPPORT.end, log_rate.mean + reach);
    if start >= end {
        vec![]
    } else if start < log_rate.mean && log_rate.mean < end {
        vec![start..log_rate.mean, log_rate.mean..end]
    } else {
        vec![start..end]
    }
}

/// Expected value of `f(x)` for `x` drawn from the `log_rate` distribution.
pub fn expect(log_rate: &Normal, mut f: impl FnMut(f64) -> f64, config: &QuadConfig) -> f64 {
    if log_rate.is_point_mass() {
        return f(log_rate.mean);
    }
    pieces(log_rate)
        .into_iter()
        .map(|range| integrate(|x| f(x) * log_rate.pdf(x), range.start, range.end, config).value)
        .sum()
}

/// Expected value of `f(x, y)` for independent `x` and `y` drawn from the `log_rate_x` and
/// `log_rate_y` distributions respectively.
pub fn expect_pair(
    log_rate_x: &Normal,
    log_rate_y: &Normal,
    mut f: impl FnMut(f64, f64) -> f64,
    config: &QuadConfig,
) -> f64 {
    match (log_rate_x.is_point_mass(), log_rate_y.is_point_mass()) {
        (true, true) => f(log_rate_x.mean, log_rate_y.mean),
        (true, false) => expect(log_rate_y, |y| f(log_rate_x.mean, y), config),
        (false, true) => expect(log_rate_x, |x| f(x, log_rate_y.mean), config),
        (false, false) => {
            let y_pieces = pieces(log_rate_y);
            let mut total = 0.0;
            for x_range in pieces(log_rate_x) {
                for y_range in &y_pieces {
                    total += integrate_2d(
                        |x, y| f(x, y) * log_rate_x.pdf(x) * log_rate_y.pdf(y),
                        x_range.clone(),
                        y_range.clone(),
                        config,
                    )
                    .value;
                }
            }
            total
        }
    }
}

/// Probability that the first process fires before the second, `λ₁ / (λ₁ + λ₂)`, averaged over
/// both log-rate distributions.
pub fn race(log_rate_1: &Normal, log_rate_2: &Normal, config: &QuadConfig) -> f64 {
    expect_pair(
        log_rate_1,
        log_rate_2,
        |x, y| {
            // λ₁ / (λ₁ + λ₂) = 1 / (1 + e^(y - x)), which avoids overflowing either rate
            1.0 / (1.0 + f64::exp(y - x))
        },
        config,
    )
}

/// Probability that at least one of the two processes fires within the elapsed time `t`, with
/// time measured in the units of the rates.
pub fn event_within(t: f64, log_rate_1: &Normal, log_rate_2: &Normal, config: &QuadConfig) -> f64 {
    expect_pair(
        log_rate_1,
        log_rate_2,
        |x, y| -f64::exp_m1(-(x.exp() + y.exp()) * t),
        config,
    )
}
