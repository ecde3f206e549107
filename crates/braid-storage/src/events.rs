use braid_core::types::VertexId;

/// Notifications the indexing layer publishes when the voided set changes.
/// The conflict resolver that flips `voided_by` lives outside this
/// workspace; subscribers here only observe its effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageEvent {
    VertexVoided(VertexId),
    VertexUnvoided(VertexId),
}

/// Optional event bus collaborator. Storage degrades to a no-op when no
/// sink is attached.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: StorageEvent);
}
