//! Read-only verification snapshots.
//!
//! Verifying a candidate vertex needs its parents, the vertices whose
//! outputs it spends, and sometimes a short block ancestry — nothing else.
//! A snapshot copies exactly those records (frozen encoded bytes plus a
//! metadata copy) out of the live store, so verification can proceed
//! without touching it again. Independent candidates can each get their
//! own snapshot and be verified concurrently.

use braid_core::error::BraidError;
use braid_core::types::VertexId;
use braid_dag::{codec, Vertex, VertexMetadata};
use std::collections::HashMap;

use crate::store::VertexStore;

#[derive(Default)]
pub struct SnapshotStore {
    records: HashMap<VertexId, (Vec<u8>, VertexMetadata)>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy one vertex (encoded bytes + metadata) out of the live store.
    pub fn add_vertex_from_store<S: VertexStore + ?Sized>(
        &mut self,
        store: &S,
        id: &VertexId,
    ) -> Result<(), BraidError> {
        if self.records.contains_key(id) {
            return Ok(());
        }
        let vertex = store.get(id)?;
        let metadata = store.metadata_or_new(id);
        self.records.insert(*id, (vertex.encode(), metadata));
        Ok(())
    }

    /// Copy a candidate's full dependency set: its parents and the vertices
    /// its inputs spend, plus the grandparents the parent validator
    /// inspects.
    pub fn add_dependencies_from_store<S: VertexStore + ?Sized>(
        &mut self,
        store: &S,
        candidate: &Vertex,
    ) -> Result<(), BraidError> {
        for parent in &candidate.parents {
            self.add_vertex_from_store(store, parent)?;
            let parent_vertex = store.get(parent)?;
            for grandparent in &parent_vertex.parents {
                self.add_vertex_from_store(store, grandparent)?;
            }
        }
        for input in &candidate.inputs {
            self.add_vertex_from_store(store, &input.tx_id)?;
        }
        Ok(())
    }

    pub fn contains(&self, id: &VertexId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode a frozen vertex on demand.
    pub fn get_vertex(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        let (bytes, _) = self
            .records
            .get(id)
            .ok_or_else(|| BraidError::VertexDoesNotExist(id.to_hex()))?;
        codec::decode(bytes)
    }

    pub fn get_block(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        let vertex = self.get_vertex(id)?;
        if !vertex.is_block() {
            return Err(BraidError::NotABlock(id.to_hex()));
        }
        Ok(vertex)
    }

    pub fn get_transaction(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        let vertex = self.get_vertex(id)?;
        if vertex.is_block() {
            return Err(BraidError::NotATransaction(id.to_hex()));
        }
        Ok(vertex)
    }

    /// The block parent (first listed parent) of a block in the snapshot.
    pub fn get_parent_block(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        let block = self.get_block(id)?;
        let parent = block
            .parents
            .first()
            .ok_or_else(|| BraidError::VertexDoesNotExist(format!("{} has no parents", id)))?;
        self.get_block(parent)
    }

    pub fn get_metadata(&self, id: &VertexId) -> Result<VertexMetadata, BraidError> {
        self.records
            .get(id)
            .map(|(_, meta)| meta.clone())
            .ok_or_else(|| BraidError::MetadataDoesNotExist(id.to_hex()))
    }

    /// Lookup closure for the parent validator.
    pub fn lookup(&self) -> impl Fn(&VertexId) -> Option<Vertex> + '_ {
        |id| self.get_vertex(id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use braid_dag::{verify_parents, TxOutput, VertexKind};
    use braid_genesis::genesis_vertices;

    fn new_tx(timestamp: u32, parents: Vec<VertexId>) -> Vertex {
        let mut tx = Vertex::new(VertexKind::Transaction, timestamp);
        tx.weight = 1.0;
        tx.outputs.push(TxOutput::new(10, vec![0x51]));
        tx.parents = parents;
        tx.update_hash();
        tx
    }

    #[test]
    fn snapshot_holds_frozen_copies() {
        let store = MemoryStore::new();
        let [b, _, _] = genesis_vertices();
        let id = b.id().unwrap();
        let mut snap = SnapshotStore::new();
        snap.add_vertex_from_store(&store, &id).unwrap();
        assert!(snap.contains(&id));
        assert_eq!(snap.get_vertex(&id).unwrap(), *b);
        assert_eq!(snap.get_block(&id).unwrap().hash(), b.hash());
    }

    #[test]
    fn kind_checks_apply() {
        let store = MemoryStore::new();
        let [b, t1, _] = genesis_vertices();
        let mut snap = SnapshotStore::new();
        snap.add_vertex_from_store(&store, &b.id().unwrap()).unwrap();
        snap.add_vertex_from_store(&store, &t1.id().unwrap()).unwrap();
        assert!(matches!(
            snap.get_transaction(&b.id().unwrap()),
            Err(BraidError::NotATransaction(_))
        ));
        assert!(matches!(snap.get_block(&t1.id().unwrap()), Err(BraidError::NotABlock(_))));
    }

    #[test]
    fn missing_record_is_a_lookup_error() {
        let snap = SnapshotStore::new();
        let unknown = VertexId::from_bytes([9; 32]);
        assert!(matches!(snap.get_vertex(&unknown), Err(BraidError::VertexDoesNotExist(_))));
    }

    #[test]
    fn validator_runs_against_a_snapshot() {
        let mut store = MemoryStore::new();
        let [_, t1, t2] = genesis_vertices();
        let funding = new_tx(t2.timestamp + 5, vec![t1.id().unwrap(), t2.id().unwrap()]);
        store.save(&funding, false).unwrap();

        let candidate =
            new_tx(t2.timestamp + 10, vec![funding.id().unwrap(), t1.id().unwrap()]);
        let mut snap = SnapshotStore::new();
        snap.add_dependencies_from_store(&store, &candidate).unwrap();
        // Parents plus t2 (a grandparent through funding).
        assert_eq!(snap.len(), 3);
        assert!(verify_parents(&candidate, snap.lookup()).is_ok());
    }
}
