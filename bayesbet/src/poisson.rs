use crate::factorial::Factorial;
use crate::normal::Normal;
use crate::probs::SliceExt;
use crate::quad::QuadConfig;
use crate::rate;

#[inline]
pub fn univariate(k: u8, lambda: f64, factorial: &impl Factorial) -> f64 {
    lambda.powi(k as i32) * f64::exp(-lambda) / factorial.get(k) as f64
}

/// Poisson mass at `k` for the rate `e^log_lambda`, evaluated in log space so that large
/// rates do not overflow.
#[inline]
pub fn univariate_log_rate(k: u8, log_lambda: f64, factorial: &impl Factorial) -> f64 {
    f64::exp(k as f64 * log_lambda - log_lambda.exp() - factorial.ln(k))
}

/// Mass function of a Poisson count whose log-rate is distributed as `log_rate`. The returned
/// vector holds `max_goals + 2` elements: the probabilities of `0..=max_goals`, followed by
/// an overflow bucket that absorbs the remaining mass, so that the elements sum to 1. A
/// point-mass log-rate yields the plain Poisson pmf.
pub fn mixture_pmf(
    log_rate: &Normal,
    max_goals: u8,
    factorial: &impl Factorial,
    config: &QuadConfig,
) -> Vec<f64> {
    let mut probs = Vec::with_capacity(max_goals as usize + 2);
    if log_rate.is_point_mass() {
        let lambda = log_rate.mean.exp();
        probs.extend((0..=max_goals).map(|k| univariate(k, lambda, factorial)));
    } else {
        for k in 0..=max_goals {
            probs.push(rate::expect(
                log_rate,
                |x| univariate_log_rate(k, x, factorial),
                config,
            ));
        }
    }
    let overflow = 1.0 - probs.sum();
    probs.push(overflow);
    probs
}
