//! Future-returning wrapper over any blocking [`VertexStore`].
//!
//! Mirrors the synchronous API one-to-one by running it inline: the
//! single-writer assumption of the storage layer holds (the wrapper owns
//! the store), and the operations are short enough that handing them to a
//! blocking pool buys nothing at this layer.

use braid_core::error::BraidError;
use braid_core::types::{Timestamp, VertexId};
use braid_dag::{Vertex, VertexMetadata};
use std::collections::HashSet;

use crate::store::VertexStore;

pub struct DeferredStore<S: VertexStore> {
    inner: S,
}

impl<S: VertexStore> DeferredStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Direct access to the wrapped blocking store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub async fn save(&mut self, vertex: &Vertex, only_metadata: bool) -> Result<(), BraidError> {
        self.inner.save(vertex, only_metadata)
    }

    pub async fn contains(&self, id: &VertexId) -> bool {
        self.inner.contains(id)
    }

    pub async fn get(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        self.inner.get(id)
    }

    pub async fn get_block(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        self.inner.get_block(id)
    }

    pub async fn get_transaction(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        self.inner.get_transaction(id)
    }

    pub async fn get_metadata(&self, id: &VertexId) -> Result<VertexMetadata, BraidError> {
        self.inner.get_metadata(id)
    }

    pub async fn save_metadata(&mut self, metadata: &VertexMetadata) -> Result<(), BraidError> {
        self.inner.save_metadata(metadata)
    }

    pub async fn block_count(&self) -> usize {
        self.inner.block_count()
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.transaction_count()
    }

    pub async fn latest_timestamp(&self) -> Timestamp {
        self.inner.latest_timestamp()
    }

    pub async fn block_tips(&self, timestamp: Option<Timestamp>) -> HashSet<VertexId> {
        self.inner.block_tips(timestamp)
    }

    pub async fn transaction_tips(&self, timestamp: Option<Timestamp>) -> HashSet<VertexId> {
        self.inner.transaction_tips(timestamp)
    }

    pub async fn get_newest_blocks(&self, count: usize) -> (Vec<VertexId>, bool) {
        self.inner.get_newest_blocks(count)
    }

    pub async fn get_newest_transactions(&self, count: usize) -> (Vec<VertexId>, bool) {
        self.inner.get_newest_transactions(count)
    }

    pub async fn get_older_blocks_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.inner.get_older_blocks_after(timestamp, hash, count)
    }

    pub async fn get_newer_blocks_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.inner.get_newer_blocks_after(timestamp, hash, count)
    }

    pub async fn get_older_transactions_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.inner.get_older_transactions_after(timestamp, hash, count)
    }

    pub async fn get_newer_transactions_after(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        self.inner.get_newer_transactions_after(timestamp, hash, count)
    }
}
