use braid_core::error::BraidError;
use braid_core::types::VertexId;
use braid_dag::{Vertex, VertexMetadata};
use braid_genesis::genesis_vertices;
use std::collections::HashMap;

use crate::indexes::StoreIndexes;
use crate::store::VertexStore;

/// Hash-map backed store. The primary backend for tests and the reference
/// for backend semantics: the file and sled backends must be
/// indistinguishable from this one through the [`VertexStore`] trait.
pub struct MemoryStore {
    vertices: HashMap<VertexId, Vertex>,
    metadata: HashMap<VertexId, VertexMetadata>,
    indexes: StoreIndexes,
}

impl MemoryStore {
    /// An empty store pre-populated with the genesis vertices.
    pub fn new() -> Self {
        Self::with_indexes(StoreIndexes::new())
    }

    /// Like [`MemoryStore::new`] with a pre-configured index set (e.g. one
    /// carrying an event sink).
    pub fn with_indexes(indexes: StoreIndexes) -> Self {
        let mut store =
            Self { vertices: HashMap::new(), metadata: HashMap::new(), indexes };
        for vertex in genesis_vertices() {
            // Genesis vertices are hashed at construction.
            if let Some(id) = vertex.hash().copied() {
                store.vertices.insert(id, vertex.clone());
                store.metadata.insert(id, VertexMetadata::new(id));
                store.indexes.add_vertex(vertex, id);
            }
        }
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexStore for MemoryStore {
    fn save(&mut self, vertex: &Vertex, only_metadata: bool) -> Result<(), BraidError> {
        let id = vertex.id()?;
        if !only_metadata {
            self.vertices.insert(id, vertex.clone());
        }
        self.metadata.entry(id).or_insert_with(|| VertexMetadata::new(id));
        Ok(())
    }

    fn contains(&self, id: &VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    fn get(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        self.vertices.get(id).cloned().ok_or_else(|| BraidError::VertexDoesNotExist(id.to_hex()))
    }

    fn get_metadata(&self, id: &VertexId) -> Result<VertexMetadata, BraidError> {
        self.metadata.get(id).cloned().ok_or_else(|| BraidError::MetadataDoesNotExist(id.to_hex()))
    }

    fn save_metadata(&mut self, metadata: &VertexMetadata) -> Result<(), BraidError> {
        self.metadata.insert(metadata.hash, metadata.clone());
        Ok(())
    }

    fn all_vertices(&self) -> Result<Vec<Vertex>, BraidError> {
        Ok(self.vertices.values().cloned().collect())
    }

    fn indexes(&self) -> &StoreIndexes {
        &self.indexes
    }

    fn indexes_mut(&mut self) -> &mut StoreIndexes {
        &mut self.indexes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_dag::{TxInput, TxOutput, VertexKind};
    use braid_genesis::genesis_block;

    fn new_tx(timestamp: u32, parents: Vec<VertexId>) -> Vertex {
        let mut tx = Vertex::new(VertexKind::Transaction, timestamp);
        tx.weight = 1.0;
        tx.outputs.push(TxOutput::new(10, vec![0x51]));
        tx.parents = parents;
        tx.update_hash();
        tx
    }

    #[test]
    fn opens_with_genesis() {
        let store = MemoryStore::new();
        assert_eq!(store.block_count(), 1);
        assert_eq!(store.transaction_count(), 2);
        let genesis_id = genesis_block().id().unwrap();
        assert!(store.contains(&genesis_id));
        assert!(store.get_block(&genesis_id).is_ok());
    }

    #[test]
    fn kind_checked_lookups() {
        let store = MemoryStore::new();
        let genesis_id = genesis_block().id().unwrap();
        assert!(matches!(
            store.get_transaction(&genesis_id),
            Err(BraidError::NotATransaction(_))
        ));
    }

    #[test]
    fn missing_vertex_is_a_lookup_error() {
        let store = MemoryStore::new();
        let unknown = VertexId::from_bytes([0xaa; 32]);
        assert!(matches!(store.get(&unknown), Err(BraidError::VertexDoesNotExist(_))));
        assert!(matches!(
            store.get_metadata(&unknown),
            Err(BraidError::MetadataDoesNotExist(_))
        ));
    }

    #[test]
    fn update_parents_records_children() {
        let mut store = MemoryStore::new();
        let [_, t1, t2] = genesis_vertices();
        let tx = new_tx(t2.timestamp + 10, vec![t1.id().unwrap(), t2.id().unwrap()]);
        let id = tx.id().unwrap();
        store.save(&tx, false).unwrap();
        store.update_parents(&tx).unwrap();
        assert!(store.get_metadata(&t1.id().unwrap()).unwrap().children.contains(&id));
        assert!(store.get_metadata(&t2.id().unwrap()).unwrap().children.contains(&id));
    }

    #[test]
    fn mark_inputs_as_used_records_spenders() {
        let mut store = MemoryStore::new();
        let [_, t1, t2] = genesis_vertices();
        let funding = new_tx(t2.timestamp + 10, vec![t1.id().unwrap(), t2.id().unwrap()]);
        let funding_id = funding.id().unwrap();
        store.save(&funding, false).unwrap();

        let mut spender = new_tx(t2.timestamp + 20, vec![t1.id().unwrap(), t2.id().unwrap()]);
        spender.inputs.push(TxInput::new(funding_id, 0, vec![]));
        spender.update_hash();
        store.save(&spender, false).unwrap();
        store.mark_inputs_as_used(&spender).unwrap();

        let meta = store.get_metadata(&funding_id).unwrap();
        assert!(meta.spent_outputs[&0].contains(&spender.id().unwrap()));
    }

    #[test]
    fn accumulated_weight_covers_descendants() {
        let mut store = MemoryStore::new();
        let [_, t1, t2] = genesis_vertices();
        let t1_id = t1.id().unwrap();
        let tx = new_tx(t2.timestamp + 10, vec![t1_id, t2.id().unwrap()]);
        store.save(&tx, false).unwrap();
        store.update_parents(&tx).unwrap();

        let acc = store.update_accumulated_weight(&t1_id).unwrap();
        // t1 weight 14 plus a descendant of weight 1: strictly more than 14.
        assert!(acc > t1.weight);
        assert_eq!(store.get_metadata(&t1_id).unwrap().accumulated_weight, acc);
    }

    #[test]
    fn rebuild_indexes_restores_counts() {
        let mut store = MemoryStore::new();
        let [_, t1, t2] = genesis_vertices();
        let tx = new_tx(t2.timestamp + 10, vec![t1.id().unwrap(), t2.id().unwrap()]);
        store.save(&tx, false).unwrap();
        store.add_to_indexes(&tx).unwrap();
        assert_eq!(store.transaction_count(), 3);

        // Simulate a cold open: same vertex table, fresh indexes.
        store.indexes = StoreIndexes::new();
        assert_eq!(store.transaction_count(), 0);
        store.rebuild_indexes().unwrap();
        assert_eq!(store.transaction_count(), 3);
        assert_eq!(store.block_count(), 1);
        assert!(store.transaction_tips(None).contains(&tx.id().unwrap()));
    }
}
