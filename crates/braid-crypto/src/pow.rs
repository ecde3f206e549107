use braid_core::types::VertexId;
use primitive_types::U256;

/// Proof-of-work target for a weight: `2^(256 - weight) - 1`.
///
/// The exponent is fractional, so the target carries the 53-bit precision
/// of `f64` — the same precision the weight itself was assigned with.
pub fn pow_target(weight: f64) -> U256 {
    let exponent = 256.0 - weight;
    if exponent <= 0.0 {
        return U256::zero();
    }
    if exponent >= 256.0 {
        return U256::MAX;
    }
    // exponent in (0, 256), so 2^exponent fits an f64 comfortably.
    u256_from_f64(exponent.exp2()) - U256::one()
}

/// The PoW gate: integer value of the hash strictly below the target.
pub fn meets_target(hash: &VertexId, weight: f64) -> bool {
    U256::from_big_endian(hash.as_bytes()) < pow_target(weight)
}

/// Exact floor conversion of a non-negative finite f64 into a U256.
fn u256_from_f64(x: f64) -> U256 {
    debug_assert!(x.is_finite() && x >= 0.0);
    if x < 1.0 {
        return U256::zero();
    }
    let bits = x.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64 - 1023;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    // x = mantissa * 2^(exponent - 52); x >= 1 rules out subnormals.
    let shift = exponent - 52;
    if shift >= 0 {
        U256::from(mantissa) << (shift as usize)
    } else {
        U256::from(mantissa >> (-shift) as u32)
    }
}
