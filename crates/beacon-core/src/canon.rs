// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Float canonicalization for deterministic comparison and hashing.
//!
//! Anchor locations are compared and hashed through these projections so that
//! values differing only below micro-unit precision (or only in the sign of
//! zero) are treated as the same location.

/// Quantization steps per world unit.
const SCALE: f64 = 1_000_000.0;

/// Project a coordinate onto its canonical micro-unit grid value.
///
/// Do NOT use this to mutate stored positions; it's a projection for
/// comparison. NaN maps to a fixed sentinel; infinities saturate.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn quantize(x: f64) -> i64 {
    if x.is_nan() {
        return i64::MIN;
    }
    // `as` saturates out-of-range values and folds -0.0 into 0.
    (x * SCALE).round() as i64
}

/// Canonicalize a position triple for comparison/hashing.
pub(crate) fn quantize_position(x: f64, y: f64, z: f64) -> [i64; 3] {
    [quantize(x), quantize(y), quantize(z)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(quantize(-0.0), quantize(0.0));
    }

    #[test]
    fn sub_micro_noise_is_ignored() {
        assert_eq!(quantize(1.000_000_01), quantize(1.0));
        assert_ne!(quantize(1.000_01), quantize(1.0));
    }

    #[test]
    fn non_finite_values_do_not_panic() {
        assert_eq!(quantize(f64::NAN), i64::MIN);
        assert_eq!(quantize(f64::INFINITY), i64::MAX);
        assert_eq!(quantize(f64::NEG_INFINITY), i64::MIN);
    }
}
