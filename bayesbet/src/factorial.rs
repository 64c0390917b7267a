//! Factorials of small integers, as used by Poisson mass functions.

pub trait Factorial {
    fn get(&self, n: u8) -> u128;

    /// Natural logarithm of `n!`.
    #[inline]
    fn ln(&self, n: u8) -> f64 {
        (self.get(n) as f64).ln()
    }
}

/// Computes factorials on demand. Serves as the reference for [`Lookup`] in tests.
#[cfg(test)]
#[derive(Default)]
pub struct Calculator;

#[cfg(test)]
impl Factorial for Calculator {
    #[inline]
    fn get(&self, n: u8) -> u128 {
        assert!(n <= 34, "{n}! overflows");
        (2..=n as u128).product()
    }
}

const MAX_FACTORIAL_ENTRIES: usize = 35;

/// Precomputed factorials up to 34!, the largest that fits in a `u128`.
pub struct Lookup {
    entries: [u128; MAX_FACTORIAL_ENTRIES],
    ln_entries: [f64; MAX_FACTORIAL_ENTRIES],
}
impl Factorial for Lookup {
    #[inline]
    fn get(&self, n: u8) -> u128 {
        self.entries[n as usize]
    }

    #[inline]
    fn ln(&self, n: u8) -> f64 {
        self.ln_entries[n as usize]
    }
}

impl Default for Lookup {
    fn default() -> Self {
        let mut entries = [1u128; MAX_FACTORIAL_ENTRIES];
        let mut ln_entries = [0.0; MAX_FACTORIAL_ENTRIES];
        for i in 2..MAX_FACTORIAL_ENTRIES {
            entries[i] = i as u128 * entries[i - 1];
            ln_entries[i] = (entries[i] as f64).ln();
        }
        Self {
            entries,
            ln_entries,
        }
    }
}
