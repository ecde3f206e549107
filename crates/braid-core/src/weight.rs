//! Log-domain work arithmetic.
//!
//! Weights encode work as log2(work). Combining two weights therefore adds
//! the works they represent, not the weights themselves. Zero is a special
//! accumulated weight meaning "no work yet": it behaves as the identity in
//! both directions so that the first weight folded into a fresh
//! accumulation is exact.

/// Combine two weights: log2(2^w1 + 2^w2).
pub fn sum_weights(w1: f64, w2: f64) -> f64 {
    let a = w1.max(w2);
    let b = w1.min(w2);
    if b == 0.0 {
        // Zero is the no-work sentinel. We could use f64::NEG_INFINITY,
        // but it is not serializable.
        return a;
    }
    a + (1.0 + (b - a).exp2()).log2()
}

/// Remove w2's contribution from w1: log2(2^w1 - 2^w2).
///
/// Requires w1 >= w2; equal weights cancel to zero.
pub fn sub_weights(w1: f64, w2: f64) -> f64 {
    debug_assert!(w1 >= w2);
    if w1 == w2 {
        return 0.0;
    }
    if w2 == 0.0 {
        return w1;
    }
    w1 + (1.0 - (w2 - w1).exp2()).log2()
}

/// Convert a weight to work, rounding to the nearest integer. Display only.
pub fn weight_to_work(weight: f64) -> u128 {
    (0.5 + weight.exp2()) as u128
}
