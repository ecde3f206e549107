use braid_core::constants::{
    EXPECTED_BLOCK_PARENTS, EXPECTED_TX_PARENTS, MAX_NONCE, MAX_NUM_INPUTS, MAX_NUM_OUTPUTS,
    MINING_TIMESTAMP_REFRESH_SECS, MIN_WEIGHT, TOKEN_AUTHORITY_MASK, TOKEN_INDEX_MASK,
};
use braid_core::error::BraidError;
use braid_core::types::{Height, Timestamp, TokenUid, VertexId};
use braid_crypto::pow::{meets_target, pow_target};
use braid_crypto::{finish_hash, partial_hash, vertex_hash};
use chrono::Utc;
use primitive_types::U256;
use std::fmt;
use tracing::debug;

use crate::codec;

// ── VertexKind ───────────────────────────────────────────────────────────────

/// The two vertex variants. The kind doubles as the wire version tag and
/// resolves all variant-specific structure (expected parent counts, whether
/// inputs are allowed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Block,
    Transaction,
}

impl VertexKind {
    /// Wire version tag: 0 = block, 1 = transaction.
    pub fn version(&self) -> u16 {
        match self {
            VertexKind::Block => 0,
            VertexKind::Transaction => 1,
        }
    }

    pub fn from_version(version: u16) -> Option<Self> {
        match version {
            0 => Some(VertexKind::Block),
            1 => Some(VertexKind::Transaction),
            _ => None,
        }
    }

    /// Blocks confirm one previous block; transactions confirm none.
    pub fn expected_block_parents(&self) -> usize {
        match self {
            VertexKind::Block => EXPECTED_BLOCK_PARENTS,
            VertexKind::Transaction => 0,
        }
    }

    /// Both variants confirm exactly two transactions.
    pub fn expected_tx_parents(&self) -> usize {
        EXPECTED_TX_PARENTS
    }

    pub fn allows_inputs(&self) -> bool {
        matches!(self, VertexKind::Transaction)
    }
}

// ── Inputs / outputs ─────────────────────────────────────────────────────────

/// A borrowed reference to a prior vertex's output. Spent/unspent status is
/// derived from metadata, never stored here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// Hash of the vertex that contains the output being spent.
    pub tx_id: VertexId,
    /// Index of the output inside that vertex (1 byte on the wire).
    pub index: u8,
    /// Data that solves the output's script.
    pub data: Vec<u8>,
}

impl TxInput {
    pub fn new(tx_id: VertexId, index: u8, data: Vec<u8>) -> Self {
        Self { tx_id, index, data }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// Amount (4 bytes on the wire) — or an authority bit-flag set when the
    /// authority bit of `token_data` is on.
    pub value: u32,
    /// Low 7 bits: token index into `tokens` (0 = native token).
    /// High bit: authority marker.
    pub token_data: u8,
    /// Locking script.
    pub script: Vec<u8>,
}

impl TxOutput {
    pub fn new(value: u32, script: Vec<u8>) -> Self {
        Self { value, token_data: 0, script }
    }

    pub fn new_with_token(value: u32, token_data: u8, script: Vec<u8>) -> Self {
        Self { value, token_data, script }
    }

    pub fn token_index(&self) -> u8 {
        self.token_data & TOKEN_INDEX_MASK
    }

    pub fn is_token_authority(&self) -> bool {
        self.token_data & TOKEN_AUTHORITY_MASK != 0
    }

    /// Check one of the TOKEN_AUTHORITY_* flags. Always false on a value
    /// output.
    pub fn has_authority(&self, flag: u32) -> bool {
        self.is_token_authority() && self.value & flag != 0
    }
}

// ── Vertex ───────────────────────────────────────────────────────────────────

/// A vertex in the DAG: a block or a transaction.
///
/// The hash is absent until `update_hash` (or a successful `resolve`)
/// computes it from the canonical encoding; after that the vertex is an
/// immutable value as far as consensus is concerned, and all mutable state
/// lives in its [`VertexMetadata`](crate::metadata::VertexMetadata).
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub kind: VertexKind,
    /// Proof-of-work search variable.
    pub nonce: u32,
    /// Moment of creation; strictly greater than every parent's timestamp.
    pub timestamp: Timestamp,
    /// Log2-encoded work score, assigned before mining.
    pub weight: f64,
    /// Block height; carried for transactions but only authoritative for
    /// blocks.
    pub height: Height,
    /// Outputs being spent (always empty for blocks).
    pub inputs: Vec<TxInput>,
    /// Outputs being created.
    pub outputs: Vec<TxOutput>,
    /// Confirmed vertices: blocks list [block, tx, tx], transactions [tx, tx].
    pub parents: Vec<VertexId>,
    /// Token ids referenced by outputs. Index 0 is the implicit native token
    /// and is never listed here.
    pub tokens: Vec<TokenUid>,
    hash: Option<VertexId>,
}

impl Vertex {
    pub fn new(kind: VertexKind, timestamp: Timestamp) -> Self {
        Self {
            kind,
            nonce: 0,
            timestamp,
            weight: 0.0,
            height: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parents: Vec::new(),
            tokens: Vec::new(),
            hash: None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, VertexKind::Block)
    }

    /// Genesis vertices are the only ones with no parents.
    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn version(&self) -> u16 {
        self.kind.version()
    }

    /// The computed hash, if `update_hash` or `resolve` has run.
    pub fn hash(&self) -> Option<&VertexId> {
        self.hash.as_ref()
    }

    /// The computed hash, or `MissingHash` when the vertex was never hashed.
    pub fn id(&self) -> Result<VertexId, BraidError> {
        self.hash.ok_or(BraidError::MissingHash)
    }

    /// Sum of the value of all non-authority outputs.
    pub fn sum_outputs(&self) -> u64 {
        self.outputs
            .iter()
            .filter(|o| !o.is_token_authority())
            .map(|o| o.value as u64)
            .sum()
    }

    /// Resolve a token index from an output: 0 is the implicit native token,
    /// higher indexes select from `tokens`.
    pub fn token_uid(&self, token_index: u8) -> Option<TokenUid> {
        if token_index == 0 {
            return Some(TokenUid::native());
        }
        self.tokens.get(token_index as usize - 1).copied()
    }

    // ── Encoding ─────────────────────────────────────────────────────────────

    /// Canonical encoding without the trailing nonce (the bytes covered by
    /// the first hash round).
    pub fn encode_without_nonce(&self) -> Vec<u8> {
        codec::encode_without_nonce(self)
    }

    /// Complete canonical encoding.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Signature-scoped encoding: stable across remining and independent of
    /// confirmation metadata.
    pub fn sighash_bytes(&self) -> Vec<u8> {
        codec::sighash_bytes(self)
    }

    // ── Hashing & proof-of-work ──────────────────────────────────────────────

    /// `sha256(sha256(encode_without_nonce || nonce))` from the current
    /// fields.
    pub fn calculate_hash(&self) -> VertexId {
        vertex_hash(&self.encode_without_nonce(), self.nonce)
    }

    pub fn update_hash(&mut self) {
        self.hash = Some(self.calculate_hash());
    }

    pub fn target(&self) -> U256 {
        pow_target(self.weight)
    }

    /// Verify hash integrity and the proof-of-work gate.
    pub fn verify_pow(&self) -> Result<(), BraidError> {
        let stored = self.id()?;
        let computed = self.calculate_hash();
        if computed != stored {
            return Err(BraidError::HashMismatch {
                stored: stored.to_hex(),
                computed: computed.to_hex(),
            });
        }
        if !meets_target(&stored, self.weight) {
            return Err(BraidError::PowError);
        }
        Ok(())
    }

    /// Structural checks that need no storage: PoW plus input/output caps.
    pub fn verify_without_storage(&self) -> Result<(), BraidError> {
        self.verify_pow()?;
        if self.inputs.len() > MAX_NUM_INPUTS {
            return Err(BraidError::TooManyInputs { max: MAX_NUM_INPUTS, got: self.inputs.len() });
        }
        if self.outputs.len() > MAX_NUM_OUTPUTS {
            return Err(BraidError::TooManyOutputs { max: MAX_NUM_OUTPUTS, got: self.outputs.len() });
        }
        Ok(())
    }

    /// Minimum weight this vertex should carry. For transactions:
    /// `log2(size) + log2(amount + 1) + 0.5`; blocks fall back to the
    /// network floor (their real weight comes from difficulty adjustment,
    /// which lives outside this crate).
    pub fn calculate_min_weight(&self) -> f64 {
        match self.kind {
            VertexKind::Block => MIN_WEIGHT,
            VertexKind::Transaction => {
                let size = self.encode().len() as f64;
                let amount = self.sum_outputs() as f64;
                size.log2() + (amount + 1.0).log2() + 0.5
            }
        }
    }

    // ── Mining ───────────────────────────────────────────────────────────────

    /// Run the CPU mining search and store the winning hash.
    ///
    /// `self.weight` must be set before calling. Returns false when the
    /// nonce range is exhausted.
    pub fn resolve(&mut self) -> bool {
        match self.start_mining(0, MAX_NONCE) {
            Some(found) => {
                self.hash = Some(found);
                true
            }
            None => false,
        }
    }

    /// Search `[start, end)` for a nonce whose finished hash is below the
    /// target. After 2 s of wall time the timestamp is bumped to "now", the
    /// partial digest is recomputed, and the search restarts from `start` —
    /// so the timestamp stays monotonic with the wall clock during long
    /// searches.
    pub fn start_mining(&mut self, start: u32, end: u64) -> Option<VertexId> {
        let target = self.target();
        let mut partial = partial_hash(&self.encode_without_nonce());
        let mut last_refresh = Utc::now().timestamp();

        let mut nonce = start as u64;
        while nonce < end {
            let now = Utc::now().timestamp();
            if now - last_refresh > MINING_TIMESTAMP_REFRESH_SECS {
                debug!(timestamp = now, "refreshing mining timestamp, restarting nonce search");
                self.timestamp = now as Timestamp;
                partial = partial_hash(&self.encode_without_nonce());
                last_refresh = now;
                nonce = start as u64;
            }

            self.nonce = nonce as u32;
            let candidate = finish_hash(partial.clone(), self.nonce);
            if U256::from_big_endian(candidate.as_bytes()) < target {
                return Some(candidate);
            }
            nonce += 1;
        }
        None
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_block() { "Block" } else { "Transaction" };
        let hash = self.hash.map(|h| h.to_hex()).unwrap_or_else(|| "<unhashed>".into());
        write!(
            f,
            "{}(nonce={}, timestamp={}, weight={:.2}, height={}, hash={})",
            kind, self.nonce, self.timestamp, self.weight, self.height, hash
        )
    }
}
