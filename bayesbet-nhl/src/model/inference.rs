//! Posterior sampling of the team-strength model.
//!
//! Goals scored in regulation by each side are Poisson with log-rates
//!
//! ```text
//! ln λₕ = i + h + o[home] − d[away]
//! ln λₐ = i + o[away] − d[home]
//! ```
//!
//! and the home win indicator is Bernoulli with probability `λₕ / (λₕ + λₐ)`. Each team's
//! offense and defense are the previous belief plus a small random-walk step, centred across
//! all teams so that the rating scale is identified.

use bayesbet::mcmc::{self, HmcConfig, LogDensity, SampleError, Trace};
use bayesbet::normal::Normal;
use bayesbet::probs::SliceExt;

/// A single observed game, by team position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub home: usize,
    pub away: usize,
    pub home_goals: u16,
    pub away_goals: u16,
    pub home_won: bool,
}

/// Priors of all latent variables.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorSpec {
    pub i: Normal,
    pub h: Normal,
    pub o: Vec<Normal>,
    pub d: Vec<Normal>,

    /// Standard deviation of the random-walk step added to each team's offense and defense.
    pub delta_sigma: f64,
}
impl PriorSpec {
    pub fn teams(&self) -> usize {
        self.o.len()
    }

    /// Prior of a team rating once the random-walk step is added.
    fn stepped(&self, rating: &Normal) -> Normal {
        Normal::sum_independent(&[*rating, Normal::new(0.0, self.delta_sigma)])
    }
}

/// Positions of the latent variables within a draw: `[i, h, o₀..oₙ, d₀..dₙ]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    teams: usize,
}
impl Layout {
    pub const I: usize = 0;
    pub const H: usize = 1;

    pub fn new(teams: usize) -> Self {
        Self { teams }
    }

    pub fn dimensions(&self) -> usize {
        2 + 2 * self.teams
    }

    pub fn o(&self, team: usize) -> usize {
        2 + team
    }

    pub fn d(&self, team: usize) -> usize {
        2 + self.teams + team
    }
}

/// Draws from the posterior of the team-strength model.
///
/// Every draw of the returned trace follows [`Layout`], with offense and defense already
/// centred.
pub trait Sampler {
    fn sample(&self, prior: &PriorSpec, observations: &[Observation]) -> Result<Trace, SampleError>;
}

/// Hamiltonian Monte Carlo over the uncentred ratings.
#[derive(Debug, Clone, Default)]
pub struct HmcSampler {
    pub config: HmcConfig,
}
impl HmcSampler {
    pub fn new(config: HmcConfig) -> Self {
        Self { config }
    }
}

impl Sampler for HmcSampler {
    fn sample(&self, prior: &PriorSpec, observations: &[Observation]) -> Result<Trace, SampleError> {
        let density = TeamModel::new(prior, observations);
        let layout = density.layout;
        let mut init = vec![0.0; layout.dimensions()];
        let mut scales = vec![0.0; layout.dimensions()];
        for (index, normal) in density.priors.iter().enumerate() {
            init[index] = normal.mean;
            scales[index] = normal.stddev;
        }
        let trace = mcmc::sample(&self.config, &density, &init, &scales)?;

        let mut draws = Vec::with_capacity(trace.len() * layout.dimensions());
        for draw in trace.draws() {
            let start = draws.len();
            draws.extend_from_slice(draw);
            let (o, d) = draws[start + 2..].split_at_mut(layout.teams);
            centre(o);
            centre(d);
        }
        Ok(Trace::new(layout.dimensions(), draws, trace.chains))
    }
}

fn centre(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let mean = values.mean();
    for value in values {
        *value -= mean;
    }
}

/// Log posterior density over the uncentred ratings, with the random-walk step folded into
/// the team priors.
struct TeamModel<'a> {
    layout: Layout,
    priors: Vec<Normal>,
    observations: &'a [Observation],
}
impl<'a> TeamModel<'a> {
    fn new(prior: &PriorSpec, observations: &'a [Observation]) -> Self {
        let layout = Layout::new(prior.teams());
        let mut priors = Vec::with_capacity(layout.dimensions());
        priors.push(prior.i);
        priors.push(prior.h);
        priors.extend(prior.o.iter().map(|o| prior.stepped(o)));
        priors.extend(prior.d.iter().map(|d| prior.stepped(d)));
        Self {
            layout,
            priors,
            observations,
        }
    }
}

impl LogDensity for TeamModel<'_> {
    fn dimensions(&self) -> usize {
        self.layout.dimensions()
    }

    fn evaluate(&self, theta: &[f64], gradient: &mut [f64]) -> f64 {
        let layout = self.layout;
        let teams = layout.teams;
        let mut log_p = 0.0;
        for ((normal, &x), g) in self.priors.iter().zip(theta).zip(gradient.iter_mut()) {
            log_p += normal.ln_pdf(x);
            *g = -(x - normal.mean) / normal.variance();
        }

        let (i, h) = (theta[Layout::I], theta[Layout::H]);
        let o_star = &theta[layout.o(0)..layout.o(teams)];
        let d_star = &theta[layout.d(0)..layout.d(teams)];
        let o_mean = if teams == 0 { 0.0 } else { o_star.mean() };
        let d_mean = if teams == 0 { 0.0 } else { d_star.mean() };

        // gradients of the likelihood with respect to the centred ratings
        let mut o_grad = vec![0.0; teams];
        let mut d_grad = vec![0.0; teams];
        for obs in self.observations {
            let (o_home, o_away) = (o_star[obs.home] - o_mean, o_star[obs.away] - o_mean);
            let (d_home, d_away) = (d_star[obs.home] - d_mean, d_star[obs.away] - d_mean);
            let log_rate_home = i + h + o_home - d_away;
            let log_rate_away = i + o_away - d_home;
            let (rate_home, rate_away) = (log_rate_home.exp(), log_rate_away.exp());

            let diff = log_rate_home - log_rate_away;
            let home_win_prob = 1.0 / (1.0 + f64::exp(-diff));
            let home_won = if obs.home_won { 1.0 } else { 0.0 };
            log_p += obs.home_goals as f64 * log_rate_home - rate_home
                + obs.away_goals as f64 * log_rate_away
                - rate_away
                - if obs.home_won { softplus(-diff) } else { softplus(diff) };

            let g_home = obs.home_goals as f64 - rate_home + (home_won - home_win_prob);
            let g_away = obs.away_goals as f64 - rate_away - (home_won - home_win_prob);
            gradient[Layout::I] += g_home + g_away;
            gradient[Layout::H] += g_home;
            o_grad[obs.home] += g_home;
            d_grad[obs.away] -= g_home;
            o_grad[obs.away] += g_away;
            d_grad[obs.home] -= g_away;
        }

        // centring subtracts the mean, so its Jacobian removes the mean gradient
        if teams > 0 {
            let o_grad_mean = o_grad.mean();
            let d_grad_mean = d_grad.mean();
            for team in 0..teams {
                gradient[layout.o(team)] += o_grad[team] - o_grad_mean;
                gradient[layout.d(team)] += d_grad[team] - d_grad_mean;
            }
        }
        log_p
    }
}

/// `ln(1 + eˣ)`, without overflow for large `x`.
#[inline]
fn softplus(x: f64) -> f64 {
    x.max(0.0) + f64::ln_1p(f64::exp(-x.abs()))
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    fn prior() -> PriorSpec {
        PriorSpec {
            i: Normal::new(1.0, 0.1),
            h: Normal::new(0.25, 0.05),
            o: vec![Normal::new(0.1, 0.07), Normal::new(-0.2, 0.05), Normal::new(0.05, 0.06)],
            d: vec![Normal::new(0.0, 0.05), Normal::new(0.15, 0.07), Normal::new(-0.1, 0.05)],
            delta_sigma: 0.001,
        }
    }

    fn observations() -> Vec<Observation> {
        vec![
            Observation { home: 0, away: 1, home_goals: 4, away_goals: 2, home_won: true },
            Observation { home: 2, away: 0, home_goals: 3, away_goals: 3, home_won: false },
        ]
    }

    #[test]
    fn layout() {
        let layout = Layout::new(3);
        assert_eq!(8, layout.dimensions());
        assert_eq!(2, layout.o(0));
        assert_eq!(4, layout.o(2));
        assert_eq!(5, layout.d(0));
        assert_eq!(7, layout.d(2));
    }

    #[test]
    fn softplus_stable() {
        assert_float_absolute_eq!(std::f64::consts::LN_2, softplus(0.0), 1e-15);
        assert_float_absolute_eq!(800.0, softplus(800.0), 1e-12);
        assert!(softplus(-800.0) >= 0.0 && softplus(-800.0) < 1e-300);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let prior = prior();
        let observations = observations();
        let model = TeamModel::new(&prior, &observations);
        let theta = [0.95, 0.3, 0.12, -0.25, 0.01, 0.02, 0.1, -0.12];
        let mut gradient = vec![0.0; theta.len()];
        model.evaluate(&theta, &mut gradient);

        let mut scratch = vec![0.0; theta.len()];
        const STEP: f64 = 1e-6;
        for dimension in 0..theta.len() {
            let mut forward = theta;
            forward[dimension] += STEP;
            let mut backward = theta;
            backward[dimension] -= STEP;
            let numeric = (model.evaluate(&forward, &mut scratch)
                - model.evaluate(&backward, &mut scratch))
                / (2.0 * STEP);
            assert_float_absolute_eq!(numeric, gradient[dimension], 1e-5);
        }
    }

    #[test]
    fn shifting_all_ratings_leaves_likelihood_unchanged() {
        let prior = PriorSpec {
            i: Normal::new(1.0, 0.1),
            h: Normal::new(0.25, 0.05),
            o: vec![Normal::new(0.0, 1e6); 3],
            d: vec![Normal::new(0.0, 1e6); 3],
            delta_sigma: 0.0,
        };
        let observations = observations();
        let model = TeamModel::new(&prior, &observations);
        let theta = [1.0, 0.25, 0.1, -0.1, 0.0, 0.05, 0.0, -0.05];
        let mut shifted = theta;
        for value in &mut shifted[2..5] {
            *value += 0.3;
        }
        let mut gradient = vec![0.0; theta.len()];
        let base = model.evaluate(&theta, &mut gradient);
        let moved = model.evaluate(&shifted, &mut gradient);
        // only the vanishingly flat priors register the shift
        assert_float_absolute_eq!(base, moved, 1e-9);
    }

    #[test]
    fn sampled_ratings_are_centred() {
        let sampler = HmcSampler::new(HmcConfig {
            samples: 200,
            tune: 200,
            chains: 2,
            seed: 7,
            ..HmcConfig::default()
        });
        let trace = sampler.sample(&prior(), &observations()).unwrap();
        let layout = Layout::new(3);
        assert_eq!(layout.dimensions(), trace.dimensions());
        assert_eq!(400, trace.len());
        for draw in trace.draws() {
            assert_float_absolute_eq!(0.0, draw[layout.o(0)..layout.o(3)].sum(), 1e-12);
            assert_float_absolute_eq!(0.0, draw[layout.d(0)..layout.d(3)].sum(), 1e-12);
        }
    }

    #[test]
    fn no_observations_samples_the_prior() {
        let prior = prior();
        let sampler = HmcSampler::new(HmcConfig {
            samples: 2000,
            tune: 1000,
            seed: 11,
            ..HmcConfig::default()
        });
        let trace = sampler.sample(&prior, &[]).unwrap();
        let i = Normal::fit(trace.column(Layout::I)).unwrap();
        assert_float_absolute_eq!(prior.i.mean, i.mean, 0.02);
        assert_float_relative_eq!(prior.i.stddev, i.stddev, 0.15);
    }
}
