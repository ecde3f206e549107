use braid_core::types::VertexId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mutable companion state of a persisted vertex, keyed by its hash and
/// owned by the storage layer. The vertex itself never changes after it is
/// hashed; everything that accrues afterwards lives here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexMetadata {
    /// Hash of the vertex this metadata belongs to.
    pub hash: VertexId,
    /// Which vertices spend each output: output index → spenders.
    pub spent_outputs: BTreeMap<u8, BTreeSet<VertexId>>,
    /// Vertices that list this one as a parent. Append-only during normal
    /// operation.
    pub children: BTreeSet<VertexId>,
    /// Vertices voiding this one. Written only by the conflict resolver,
    /// which lives outside this workspace.
    pub voided_by: BTreeSet<VertexId>,
    /// Conflicting transactions (same outputs spent). Consumed by the
    /// external conflict resolver.
    pub conflict_with: BTreeSet<VertexId>,
    /// Log-domain sum of this vertex's weight and all its descendants'.
    pub accumulated_weight: f64,
}

impl VertexMetadata {
    pub fn new(hash: VertexId) -> Self {
        Self {
            hash,
            spent_outputs: BTreeMap::new(),
            children: BTreeSet::new(),
            voided_by: BTreeSet::new(),
            conflict_with: BTreeSet::new(),
            accumulated_weight: 0.0,
        }
    }

    pub fn is_voided(&self) -> bool {
        !self.voided_by.is_empty()
    }

    /// Every vertex that spends any of this vertex's outputs.
    pub fn spent_by(&self) -> impl Iterator<Item = &VertexId> {
        self.spent_outputs.values().flatten()
    }
}
