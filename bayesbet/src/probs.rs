//! Utilities for working with probabilities.

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn mean(&self) -> f64;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    /// Arithmetic mean; `NaN` for an empty slice.
    fn mean(&self) -> f64 {
        self.sum() / self.len() as f64
    }
}
