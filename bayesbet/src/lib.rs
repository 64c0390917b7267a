//! Numerical building blocks for iteratively-updated Bayesian rating models.
//! Covers adaptive quadrature, normal distributions, Poisson counts with log-normally
//! distributed rates, races between competing Poisson processes, and Hamiltonian Monte Carlo.

#![allow(clippy::too_many_arguments)]

pub mod factorial;
pub mod file;
pub mod mcmc;
pub mod normal;
pub mod poisson;
pub mod probs;
pub mod quad;
pub mod rate;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
