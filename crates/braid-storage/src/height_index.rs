use braid_core::error::BraidError;
use braid_core::types::{Height, VertexId};
use tracing::info;

/// Append-only map from block height to the best-known block hash at that
/// height, seeded with the genesis block at height 0. Reorgs truncate the
/// tail and must be explicitly permitted by the caller.
#[derive(Debug)]
pub struct BlockHeightIndex {
    entries: Vec<VertexId>,
}

impl BlockHeightIndex {
    pub fn new(genesis_hash: VertexId) -> Self {
        Self { entries: vec![genesis_hash] }
    }

    pub fn get(&self, height: Height) -> Option<VertexId> {
        self.entries.get(height as usize).copied()
    }

    /// Hash of the highest indexed block. The index is never empty: it is
    /// seeded with genesis at construction.
    pub fn get_tip(&self) -> VertexId {
        self.entries[self.entries.len() - 1]
    }

    pub fn get_height_tip(&self) -> (Height, VertexId) {
        let height = (self.entries.len() - 1) as Height;
        (height, self.get_tip())
    }

    /// Record `hash` at `height`.
    ///
    /// Heights must stay contiguous: anything beyond the current tip + 1 is
    /// rejected with `MissingParentHeight`. Re-adding the stored hash is a
    /// no-op; a differing hash within range is a reorg and requires
    /// `can_reorg`, in which case the index is truncated from `height` on
    /// and the new hash appended.
    pub fn add(&mut self, height: Height, hash: VertexId, can_reorg: bool) -> Result<(), BraidError> {
        let next = self.entries.len() as Height;
        if height > next {
            return Err(BraidError::MissingParentHeight { tip: next - 1, height });
        }
        if height == next {
            self.entries.push(hash);
            return Ok(());
        }
        let stored = self.entries[height as usize];
        if stored == hash {
            return Ok(());
        }
        if !can_reorg {
            return Err(BraidError::ReorgRejected { height });
        }
        info!(
            height,
            old = %stored,
            new = %hash,
            discarded = self.entries.len() - height as usize,
            "reorg: truncating block height index"
        );
        self.entries.truncate(height as usize);
        self.entries.push(hash);
        Ok(())
    }
}
