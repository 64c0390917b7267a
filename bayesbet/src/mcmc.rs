//! Hamiltonian Monte Carlo over a differentiable log density.
//!
//! Each chain integrates Hamilton's equations with the leapfrog scheme under a diagonal mass
//! matrix derived from per-coordinate scales, so that coordinates of very different widths
//! can share a step size. The step size is tuned by dual averaging during the warm-up
//! iterations and jittered thereafter. Chains run on their own threads, each with its own
//! seeded generator, so a given seed always reproduces the same trace.

use std::f64::consts::PI;
use std::thread;
use std::time::Instant;

use anyhow::bail;
use thiserror::Error;
use tinyrand::{Rand, Seeded, Wyrand};
use tracing::debug;

/// An unnormalised log density that also yields its gradient.
pub trait LogDensity: Sync {
    fn dimensions(&self) -> usize;

    /// Returns the log density at `theta`, writing its gradient into `gradient`.
    fn evaluate(&self, theta: &[f64], gradient: &mut [f64]) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct HmcConfig {
    pub samples: usize,
    pub tune: usize,
    pub chains: usize,
    pub leapfrog_steps: usize,
    pub init_step_size: f64,
    pub target_acceptance: f64,
    pub jitter: f64,
    pub seed: u64,
}
impl HmcConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.samples == 0 {
            bail!("at least one sample must be drawn")
        }
        if self.chains == 0 {
            bail!("at least one chain must be run")
        }
        if self.leapfrog_steps == 0 {
            bail!("at least one leapfrog step is required")
        }
        if self.init_step_size <= 0.0 {
            bail!("initial step size must be positive")
        }
        if self.target_acceptance <= 0.0 || self.target_acceptance >= 1.0 {
            bail!("target acceptance must lie in (0, 1)")
        }
        if !(0.0..1.0).contains(&self.jitter) {
            bail!("step size jitter must lie in [0, 1)")
        }
        Ok(())
    }
}

impl Default for HmcConfig {
    fn default() -> Self {
        Self {
            samples: 5000,
            tune: 2000,
            chains: 3,
            leapfrog_steps: 10,
            init_step_size: 0.1,
            target_acceptance: 0.8,
            jitter: 0.1,
            seed: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("invalid sampler config: {0}")]
    InvalidConfig(#[from] anyhow::Error),

    #[error("expected {expected} dimensions, got {actual} in {argument}")]
    Dimensions {
        argument: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("scale at dimension {0} must be positive and finite")]
    InvalidScale(usize),

    #[error("log density is not finite at the initial point of chain {0}")]
    NonFiniteInitial(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainSummary {
    pub step_size: f64,
    pub acceptance_rate: f64,
    pub divergences: usize,
}

/// Post-warm-up draws of all chains, chain by chain.
#[derive(Debug, Clone)]
pub struct Trace {
    dimensions: usize,
    draws: Vec<f64>,
    pub chains: Vec<ChainSummary>,
}
impl Trace {
    /// Assembles a trace from row-major draws of `dimensions` coordinates each.
    pub fn new(dimensions: usize, draws: Vec<f64>, chains: Vec<ChainSummary>) -> Self {
        assert!(dimensions > 0, "a trace must have at least one dimension");
        assert_eq!(0, draws.len() % dimensions, "draws must be a multiple of {dimensions}");
        Self {
            dimensions,
            draws,
            chains,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.draws.len() / self.dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn draw(&self, index: usize) -> &[f64] {
        &self.draws[index * self.dimensions..(index + 1) * self.dimensions]
    }

    pub fn draws(&self) -> impl Iterator<Item = &[f64]> {
        self.draws.chunks_exact(self.dimensions)
    }

    /// The marginal draws of one coordinate.
    pub fn column(&self, dimension: usize) -> impl Iterator<Item = f64> + '_ {
        debug_assert!(dimension < self.dimensions);
        self.draws().map(move |draw| draw[dimension])
    }
}

/// Draws from `density` starting at `init`. The `scales` are rough per-coordinate widths of the
/// target; they set the inverse mass matrix.
pub fn sample(
    config: &HmcConfig,
    density: &impl LogDensity,
    init: &[f64],
    scales: &[f64],
) -> Result<Trace, SampleError> {
    config.validate()?;
    let dimensions = density.dimensions();
    check_dimensions("init", dimensions, init.len())?;
    check_dimensions("scales", dimensions, scales.len())?;
    if let Some(index) = scales
        .iter()
        .position(|&scale| scale <= 0.0 || !scale.is_finite())
    {
        return Err(SampleError::InvalidScale(index));
    }

    let start = Instant::now();
    let outputs = thread::scope(|scope| {
        let handles = (0..config.chains)
            .map(|chain| scope.spawn(move || run_chain(config, density, init, scales, chain)))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect::<Vec<_>>()
    });

    let mut draws = Vec::with_capacity(config.chains * config.samples * dimensions);
    let mut chains = Vec::with_capacity(config.chains);
    for output in outputs {
        let output = output?;
        draws.extend(output.draws);
        chains.push(output.summary);
    }
    debug!(
        "sampled {} draws of {dimensions} dimensions in {:?}: {chains:?}",
        config.chains * config.samples,
        start.elapsed()
    );
    Ok(Trace {
        dimensions,
        draws,
        chains,
    })
}

fn check_dimensions(argument: &'static str, expected: usize, actual: usize) -> Result<(), SampleError> {
    if expected != actual {
        return Err(SampleError::Dimensions {
            argument,
            expected,
            actual,
        });
    }
    Ok(())
}

struct ChainOutput {
    draws: Vec<f64>,
    summary: ChainSummary,
}

fn run_chain(
    config: &HmcConfig,
    density: &impl LogDensity,
    init: &[f64],
    scales: &[f64],
    chain: usize,
) -> Result<ChainOutput, SampleError> {
    let dimensions = init.len();
    let mut rand = Wyrand::seed(config.seed.wrapping_add(chain as u64));
    let inv_mass = scales.iter().map(|scale| scale * scale).collect::<Vec<_>>();

    let mut theta = init
        .iter()
        .zip(scales)
        .map(|(&value, &scale)| value + 0.1 * scale * random_normal(&mut rand))
        .collect::<Vec<_>>();
    let mut gradient = vec![0.0; dimensions];
    let mut log_p = density.evaluate(&theta, &mut gradient);
    if !log_p.is_finite() {
        theta.copy_from_slice(init);
        log_p = density.evaluate(&theta, &mut gradient);
        if !log_p.is_finite() {
            return Err(SampleError::NonFiniteInitial(chain));
        }
    }

    let mut proposal = vec![0.0; dimensions];
    let mut proposal_gradient = vec![0.0; dimensions];
    let mut momentum = vec![0.0; dimensions];
    let mut adaptation = DualAveraging::new(config.init_step_size, config.target_acceptance);
    let mut step_size = config.init_step_size;
    let mut draws = Vec::with_capacity(config.samples * dimensions);
    let (mut accepted, mut divergences) = (0, 0);

    for iteration in 0..config.tune + config.samples {
        let tuning = iteration < config.tune;
        let epsilon = if tuning {
            step_size
        } else {
            step_size * (1.0 + config.jitter * (2.0 * random_f64(&mut rand) - 1.0))
        };

        for (p, &scale) in momentum.iter_mut().zip(scales) {
            *p = random_normal(&mut rand) / scale;
        }
        let initial_energy = kinetic_energy(&momentum, &inv_mass) - log_p;

        proposal.copy_from_slice(&theta);
        proposal_gradient.copy_from_slice(&gradient);
        let mut proposal_log_p = log_p;
        for _ in 0..config.leapfrog_steps {
            for (p, g) in momentum.iter_mut().zip(&proposal_gradient) {
                *p += 0.5 * epsilon * g;
            }
            for ((q, p), m) in proposal.iter_mut().zip(&momentum).zip(&inv_mass) {
                *q += epsilon * m * p;
            }
            proposal_log_p = density.evaluate(&proposal, &mut proposal_gradient);
            if !proposal_log_p.is_finite() {
                break;
            }
            for (p, g) in momentum.iter_mut().zip(&proposal_gradient) {
                *p += 0.5 * epsilon * g;
            }
        }
        let final_energy = kinetic_energy(&momentum, &inv_mass) - proposal_log_p;

        let energy_change = initial_energy - final_energy;
        let accept_prob = if energy_change.is_finite() {
            f64::min(1.0, energy_change.exp())
        } else {
            divergences += 1;
            0.0
        };
        if random_f64(&mut rand) < accept_prob {
            theta.copy_from_slice(&proposal);
            gradient.copy_from_slice(&proposal_gradient);
            log_p = proposal_log_p;
            if !tuning {
                accepted += 1;
            }
        }

        if tuning {
            step_size = adaptation.update(accept_prob);
            if iteration + 1 == config.tune {
                step_size = adaptation.final_step_size();
                debug!("chain {chain} tuned step size to {step_size:.4}");
            }
        } else {
            draws.extend_from_slice(&theta);
        }
    }

    Ok(ChainOutput {
        draws,
        summary: ChainSummary {
            step_size,
            acceptance_rate: accepted as f64 / config.samples as f64,
            divergences,
        },
    })
}

#[inline]
fn kinetic_energy(momentum: &[f64], inv_mass: &[f64]) -> f64 {
    0.5 * momentum
        .iter()
        .zip(inv_mass)
        .map(|(p, m)| p * p * m)
        .sum::<f64>()
}

/// Nesterov dual averaging of the log step size, steering the mean acceptance probability
/// towards the target.
struct DualAveraging {
    mu: f64,
    target: f64,
    log_step_avg: f64,
    h_avg: f64,
    iteration: u64,
}
impl DualAveraging {
    const GAMMA: f64 = 0.05;
    const T0: f64 = 10.0;
    const KAPPA: f64 = 0.75;

    fn new(init_step_size: f64, target: f64) -> Self {
        Self {
            mu: (10.0 * init_step_size).ln(),
            target,
            log_step_avg: 0.0,
            h_avg: 0.0,
            iteration: 0,
        }
    }

    fn update(&mut self, accept_prob: f64) -> f64 {
        self.iteration += 1;
        let m = self.iteration as f64;
        let weight = 1.0 / (m + Self::T0);
        self.h_avg = (1.0 - weight) * self.h_avg + weight * (self.target - accept_prob);
        let log_step = self.mu - m.sqrt() / Self::GAMMA * self.h_avg;
        let eta = m.powf(-Self::KAPPA);
        self.log_step_avg = eta * log_step + (1.0 - eta) * self.log_step_avg;
        log_step.exp()
    }

    fn final_step_size(&self) -> f64 {
        self.log_step_avg.exp()
    }
}

/// Uniform in [0, 1).
#[inline]
fn random_f64(rand: &mut impl Rand) -> f64 {
    (rand.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Standard normal, by the Box–Muller transform.
#[inline]
fn random_normal(rand: &mut impl Rand) -> f64 {
    let u1 = 1.0 - random_f64(rand);
    let u2 = random_f64(rand);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests;
