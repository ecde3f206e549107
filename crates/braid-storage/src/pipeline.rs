//! Candidate vertex admission.
//!
//! Order matters: every check runs before the first write, so a rejected
//! candidate leaves the store untouched. After the vertex record lands,
//! the metadata hooks, indexes, height index (for blocks), and accumulated
//! weights are brought up to date, and finally the external execution
//! engine gets its callback.

use braid_core::error::BraidError;
use braid_core::types::VertexId;
use braid_dag::{verify_parents, Vertex};
use tracing::info;

use crate::height_index::BlockHeightIndex;
use crate::store::VertexStore;

/// Callback surface for the smart-contract execution engine. The substrate
/// does not interpret contract state; it only reports that a vertex was
/// durably accepted.
pub trait AcceptanceHooks {
    fn on_accepted(&mut self, vertex: &Vertex) -> Result<(), BraidError> {
        let _ = vertex;
        Ok(())
    }
}

/// Hook implementation for callers without an execution engine.
pub struct NoHooks;

impl AcceptanceHooks for NoHooks {}

/// Admit a candidate vertex into the store.
///
/// Validation order: structural caps + PoW (storage-free), then parent
/// rules against the live store. Only after both pass is anything
/// persisted. Blocks additionally extend the height index; a gap or an
/// unpermitted reorg there rejects the block, but note the vertex record
/// is already saved at that point (the two-phase save is the known
/// atomicity gap of this layer).
pub fn accept_vertex<S: VertexStore>(
    store: &mut S,
    height_index: &mut BlockHeightIndex,
    vertex: &Vertex,
    hooks: &mut dyn AcceptanceHooks,
) -> Result<VertexId, BraidError> {
    let id = vertex.id()?;
    vertex.verify_without_storage()?;
    verify_parents(vertex, |parent| store.get(parent).ok())?;

    store.save(vertex, false)?;
    store.update_parents(vertex)?;
    store.mark_inputs_as_used(vertex)?;
    store.add_to_indexes(vertex)?;

    if vertex.is_block() {
        height_index.add(vertex.height, id, false)?;
    }

    store.update_accumulated_weight(&id)?;
    for parent in &vertex.parents {
        store.update_accumulated_weight(parent)?;
    }

    hooks.on_accepted(vertex)?;
    info!(
        vertex = %id,
        is_block = vertex.is_block(),
        timestamp = vertex.timestamp,
        weight = vertex.weight,
        "accepted vertex"
    );
    Ok(id)
}
