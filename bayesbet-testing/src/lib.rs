//! Assertions shared by the test suites.

use assert_float_eq::*;

/// Asserts that the two slices are element-wise within the given relative `epsilon`.
pub fn assert_slice_f64_relative(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_relative_eq!(expected, actual, epsilon);
        }
    }
}

/// Asserts that the two slices are element-wise within the given absolute `epsilon`.
pub fn assert_slice_f64_absolute(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        assert!(
            (expected - actual).abs() <= epsilon,
            "element {index}: expected {expected}, got {actual} (ε={epsilon})"
        );
    }
}

/// Asserts that `probs` is a valid probability mass function: every element lies in
/// [0, 1] (allowing for `epsilon` of round-off) and the elements sum to 1 within `epsilon`.
pub fn assert_probability_mass(probs: &[f64], epsilon: f64) {
    for (index, &prob) in probs.iter().enumerate() {
        assert!(
            (-epsilon..=1.0 + epsilon).contains(&prob),
            "probability at {index} out of range: {prob} in {probs:?}"
        );
    }
    let sum = probs.iter().sum::<f64>();
    assert!(
        (sum - 1.0).abs() <= epsilon,
        "probabilities sum to {sum}, expected 1 ± {epsilon}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_mass_accepts_normalised() {
        assert_probability_mass(&[0.25, 0.25, 0.5], 1e-12);
    }

    #[test]
    #[should_panic(expected = "probabilities sum to")]
    fn probability_mass_rejects_unnormalised() {
        assert_probability_mass(&[0.25, 0.25, 0.25], 1e-6);
    }

    #[test]
    fn slices_within_absolute_tolerance() {
        assert_slice_f64_absolute(&[0.1, 0.2], &[0.1000001, 0.1999999], 1e-6);
    }
}
