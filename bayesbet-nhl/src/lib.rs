//! Iteratively-updated Bayesian team ratings and game outcome probabilities for professional
//! hockey.

pub mod data;
pub mod domain;
pub mod evaluate;
pub mod fixed;
pub mod model;
pub mod print;
pub mod roster;
pub mod state;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
