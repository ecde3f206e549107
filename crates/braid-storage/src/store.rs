//! The storage contract every backend satisfies, plus the index- and
//! metadata-maintenance logic shared by all of them.
//!
//! Backends supply the primitive persistence operations; everything else
//! (kind-checked lookups, pagination, tip queries, the acceptance-time
//! metadata hooks, accumulated-weight refresh, cold-start index rebuild)
//! is provided here on top of them. Callers must serialize writes
//! externally: one mutation in flight per store instance.

use braid_core::error::BraidError;
use braid_core::types::{Timestamp, VertexId};
use braid_core::weight::sum_weights;
use braid_dag::{Vertex, VertexMetadata};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::indexes::StoreIndexes;
use crate::traversal;

pub trait VertexStore {
    // ── Primitives each backend implements ───────────────────────────────────

    /// Persist a vertex (and its metadata). With `only_metadata` the vertex
    /// record is left untouched and only the metadata document is written.
    fn save(&mut self, vertex: &Vertex, only_metadata: bool) -> Result<(), BraidError>;

    fn contains(&self, id: &VertexId) -> bool;

    fn get(&self, id: &VertexId) -> Result<Vertex, BraidError>;

    fn get_metadata(&self, id: &VertexId) -> Result<VertexMetadata, BraidError>;

    fn save_metadata(&mut self, metadata: &VertexMetadata) -> Result<(), BraidError>;

    /// Every persisted vertex, in unspecified order.
    fn all_vertices(&self) -> Result<Vec<Vertex>, BraidError>;

    fn indexes(&self) -> &StoreIndexes;

    fn indexes_mut(&mut self) -> &mut StoreIndexes;

    // ── Kind-checked lookups ─────────────────────────────────────────────────

    fn get_block(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        let vertex = self.get(id)?;
        if !vertex.is_block() {
            return Err(BraidError::NotABlock(id.to_hex()));
        }
        Ok(vertex)
    }

    fn get_transaction(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        let vertex = self.get(id)?;
        if vertex.is_block() {
            return Err(BraidError::NotATransaction(id.to_hex()));
        }
        Ok(vertex)
    }

    /// Metadata for `id`, or a fresh empty record when none is stored yet.
    fn metadata_or_new(&self, id: &VertexId) -> VertexMetadata {
        self.get_metadata(id).unwrap_or_else(|_| VertexMetadata::new(*id))
    }

    // ── Counts, tips, pagination ─────────────────────────────────────────────

    fn block_count(&self) -> usize {
        self.indexes().block_count()
    }

    fn transaction_count(&self) -> usize {
        self.indexes().transaction_count()
    }

    fn latest_timestamp(&self) -> Timestamp {
        self.indexes().latest_timestamp()
    }

    fn block_tips(&self, timestamp: Option<Timestamp>) -> HashSet<VertexId> {
        self.indexes().block_tips(timestamp)
    }

    fn transaction_tips(&self, timestamp: Option<Timestamp>) -> HashSet<VertexId> {
        self.indexes().transaction_tips(timestamp)
    }

    fn get_newest_blocks(&self, count: usize) -> (Vec<VertexId>, bool) {
        self.indexes().blocks.by_timestamp.get_newest(count)
    }

    fn get_newest_transactions(&self, count: usize) -> (Vec<VertexId>, bool) {
        self.indexes().transactions.by_timestamp.get_newest(count)
    }

    fn get_older_blocks_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.indexes().blocks.by_timestamp.get_older(timestamp, hash, count)
    }

    fn get_newer_blocks_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.indexes().blocks.by_timestamp.get_newer(timestamp, hash, count)
    }

    fn get_older_transactions_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.indexes().transactions.by_timestamp.get_older(timestamp, hash, count)
    }

    fn get_newer_transactions_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.indexes().transactions.by_timestamp.get_newer(timestamp, hash, count)
    }

    // ── Index maintenance ────────────────────────────────────────────────────

    fn add_to_indexes(&mut self, vertex: &Vertex) -> Result<bool, BraidError> {
        let id = vertex.id()?;
        Ok(self.indexes_mut().add_vertex(vertex, id))
    }

    fn remove_from_indexes(&mut self, vertex: &Vertex) -> Result<bool, BraidError> {
        let id = vertex.id()?;
        Ok(self.indexes_mut().remove_vertex(vertex, &id))
    }

    /// Re-add every persisted vertex to the indexes in topological order.
    /// Run after opening a cold store whose indexes are not persisted.
    fn rebuild_indexes(&mut self) -> Result<(), BraidError>
    where
        Self: Sized,
    {
        let ordered = traversal::topological_sort(self)?;
        let total = ordered.len();
        for vertex in ordered {
            let id = vertex.id()?;
            self.indexes_mut().add_vertex(&vertex, id);
            let meta = self.metadata_or_new(&id);
            if meta.is_voided() {
                self.indexes_mut().mark_voided(id);
            }
        }
        info!(vertices = total, "rebuilt storage indexes");
        Ok(())
    }

    // ── Acceptance-time metadata hooks ───────────────────────────────────────

    /// Record the new vertex as a child of each of its parents.
    fn update_parents(&mut self, vertex: &Vertex) -> Result<(), BraidError> {
        let id = vertex.id()?;
        for parent in &vertex.parents {
            let mut meta = self.metadata_or_new(parent);
            if meta.children.insert(id) {
                self.save_metadata(&meta)?;
            }
        }
        Ok(())
    }

    /// Record, on each spent vertex, which output the new vertex consumes.
    fn mark_inputs_as_used(&mut self, vertex: &Vertex) -> Result<(), BraidError> {
        let id = vertex.id()?;
        for input in &vertex.inputs {
            let mut meta = self.metadata_or_new(&input.tx_id);
            if meta.spent_outputs.entry(input.index).or_default().insert(id) {
                self.save_metadata(&meta)?;
            }
        }
        Ok(())
    }

    /// Recompute a vertex's accumulated weight as the log-domain sum of its
    /// own weight and every descendant's, then persist it.
    fn update_accumulated_weight(&mut self, id: &VertexId) -> Result<f64, BraidError>
    where
        Self: Sized,
    {
        let root = self.get(id)?;
        let mut accumulated = root.weight;
        for descendant in traversal::bfs_children(self, id)? {
            let child = self.get(&descendant)?;
            accumulated = sum_weights(accumulated, child.weight);
        }
        let mut meta = self.metadata_or_new(id);
        meta.accumulated_weight = accumulated;
        self.save_metadata(&meta)?;
        debug!(vertex = %id, accumulated, "updated accumulated weight");
        Ok(accumulated)
    }
}
