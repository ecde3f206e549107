use thiserror::Error;

#[derive(Debug, Error)]
pub enum BraidError {
    // ── Structural / parent validation ───────────────────────────────────────
    #[error("duplicated parents in vertex {0}")]
    DuplicatedParents(String),

    #[error("incorrect parents: expected {expected_blocks} block + {expected_txs} tx, got {got_blocks} block + {got_txs} tx")]
    IncorrectParents {
        expected_blocks: usize,
        expected_txs: usize,
        got_blocks: usize,
        got_txs: usize,
    },

    #[error("parent does not exist: vertex={vertex} parent={parent}")]
    ParentDoesNotExist { vertex: String, parent: String },

    #[error("timestamp error: {0}")]
    TimestampError(String),

    #[error("too many inputs: maximum {max}, got {got}")]
    TooManyInputs { max: usize, got: usize },

    #[error("too many outputs: maximum {max}, got {got}")]
    TooManyOutputs { max: usize, got: usize },

    // ── Proof-of-work ─────────────────────────────────────────────────────────
    #[error("hash does not satisfy the proof-of-work target")]
    PowError,

    // ── Corruption ────────────────────────────────────────────────────────────
    #[error("hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("invalid sequence of bytes: {0}")]
    InvalidBytes(String),

    #[error("vertex has no hash yet; call update_hash or resolve first")]
    MissingHash,

    // ── Lookup ────────────────────────────────────────────────────────────────
    #[error("vertex does not exist: {0}")]
    VertexDoesNotExist(String),

    #[error("metadata does not exist: {0}")]
    MetadataDoesNotExist(String),

    #[error("vertex is not a block: {0}")]
    NotABlock(String),

    #[error("vertex is not a transaction: {0}")]
    NotATransaction(String),

    // ── Height index ──────────────────────────────────────────────────────────
    #[error("parent hash required: current height tip {tip}, new height {height}")]
    MissingParentHeight { tip: u64, height: u64 },

    #[error("adding block at height {height} would cause a re-org; pass can_reorg to accept")]
    ReorgRejected { height: u64 },

    // ── Backend I/O ───────────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
