//! ─── Braid Protocol Constants ───────────────────────────────────────────────
//!
//! The unit of consensus is a vertex: a block or a transaction in one DAG,
//! linked by explicit parent references and admitted by proof-of-work.

// ── Proof-of-Work ─────────────────────────────────────────────────────────────

/// Nonce is a 4-byte field; the mining search space is [0, 2^32).
pub const MAX_NONCE: u64 = 1 << 32;

/// Weight of the genesis vertices and the minimum weight of any vertex.
pub const MIN_WEIGHT: f64 = 14.0;

/// Seconds of mining before the timestamp is refreshed and the nonce
/// search restarts. Keeps the timestamp monotonic with wall clock during
/// long searches.
pub const MINING_TIMESTAMP_REFRESH_SECS: i64 = 2;

// ── DAG shape ─────────────────────────────────────────────────────────────────

/// Every vertex confirms exactly two transactions.
pub const EXPECTED_TX_PARENTS: usize = 2;

/// Blocks additionally reference exactly one previous block, listed first.
pub const EXPECTED_BLOCK_PARENTS: usize = 1;

/// Average time between blocks, in seconds.
pub const AVG_TIME_BETWEEN_BLOCKS: u32 = 64;

/// Maximum distance between two consecutive blocks (in seconds), except for
/// genesis. Prevents DoS attacks exploiting the score of a side chain:
/// P(t > T) = 1/e^30 = 9.35e-14.
pub const MAX_DISTANCE_BETWEEN_BLOCKS: u32 = 30 * AVG_TIME_BETWEEN_BLOCKS;

// ── Vertex limits ─────────────────────────────────────────────────────────────

pub const MAX_NUM_INPUTS: usize = 256;
pub const MAX_NUM_OUTPUTS: usize = 256;

/// Output value is 4 bytes on the wire.
pub const MAX_OUTPUT_VALUE: u64 = u32::MAX as u64;

// ── Tokens ────────────────────────────────────────────────────────────────────

/// Low 7 bits of an output's token_data byte select the token index.
pub const TOKEN_INDEX_MASK: u8 = 0b0111_1111;

/// High bit marks an authority output: its value is a bit-flag set, not an
/// amount.
pub const TOKEN_AUTHORITY_MASK: u8 = 0b1000_0000;

/// Authority flags carried in the value field of an authority output.
pub const TOKEN_AUTHORITY_CREATION: u32 = 0b001;
pub const TOKEN_AUTHORITY_MINT: u32 = 0b010;
pub const TOKEN_AUTHORITY_MELT: u32 = 0b100;
