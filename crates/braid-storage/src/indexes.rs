//! In-memory indexes maintained alongside every storage backend: per-kind
//! tip sets, timestamp-ordered pagination, running counts, and the voided
//! tip set. All of them are rebuilt from the vertex table on a cold open,
//! so none are persisted.

use braid_core::types::{Timestamp, VertexId};
use braid_dag::Vertex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::events::{EventSink, StorageEvent};

/// Interval end marking "no confirming descendant known yet".
const OPEN_END: Timestamp = Timestamp::MAX;

// ── Tips ─────────────────────────────────────────────────────────────────────

/// Tracks, per vertex, the half-open interval `[timestamp,
/// first_child_timestamp)` during which it was a tip. A vertex is a tip as
/// of time T iff its interval contains T.
#[derive(Debug, Default)]
pub struct TipsIndex {
    intervals: HashMap<VertexId, (Timestamp, Timestamp)>,
}

impl TipsIndex {
    pub fn contains(&self, id: &VertexId) -> bool {
        self.intervals.contains_key(id)
    }

    /// Register a vertex and close the intervals of the parents it
    /// confirms. Returns false (and changes nothing) when already present.
    pub fn add(&mut self, vertex: &Vertex, id: VertexId) -> bool {
        if self.intervals.contains_key(&id) {
            return false;
        }
        for parent in &vertex.parents {
            if let Some((_, end)) = self.intervals.get_mut(parent) {
                *end = (*end).min(vertex.timestamp);
            }
        }
        self.intervals.insert(id, (vertex.timestamp, OPEN_END));
        true
    }

    /// Drop a vertex and reopen the intervals of parents whose only
    /// confirmation it was. Returns false when the vertex was not present.
    pub fn remove(&mut self, vertex: &Vertex, id: &VertexId) -> bool {
        if self.intervals.remove(id).is_none() {
            return false;
        }
        // Parents this vertex had closed may become tips again; their true
        // end is the min timestamp over the remaining confirmers, which we
        // cannot see from here, so reopen and let the next add re-close.
        for parent in &vertex.parents {
            if let Some((_, end)) = self.intervals.get_mut(parent) {
                if *end == vertex.timestamp {
                    *end = OPEN_END;
                }
            }
        }
        true
    }

    /// Every vertex whose tip interval contains `timestamp`.
    pub fn tips_at(&self, timestamp: Timestamp) -> HashSet<VertexId> {
        self.intervals
            .iter()
            .filter(|(_, (begin, end))| *begin <= timestamp && timestamp < *end)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn interval(&self, id: &VertexId) -> Option<(Timestamp, Timestamp)> {
        self.intervals.get(id).copied()
    }
}

// ── Timestamp ordering ───────────────────────────────────────────────────────

/// Vertices ordered by `(timestamp, hash)`, backing the newest/older/newer
/// pagination queries.
#[derive(Debug, Default)]
pub struct TimestampIndex {
    entries: BTreeSet<(Timestamp, VertexId)>,
}

impl TimestampIndex {
    pub fn add(&mut self, timestamp: Timestamp, id: VertexId) -> bool {
        self.entries.insert((timestamp, id))
    }

    pub fn remove(&mut self, timestamp: Timestamp, id: &VertexId) -> bool {
        self.entries.remove(&(timestamp, *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest `count` hashes (descending) and whether older ones remain.
    pub fn get_newest(&self, count: usize) -> (Vec<VertexId>, bool) {
        let hashes: Vec<VertexId> = self.entries.iter().rev().take(count).map(|(_, id)| *id).collect();
        let has_more = self.entries.len() > hashes.len();
        (hashes, has_more)
    }

    /// Up to `count` entries strictly older than `(timestamp, hash)`,
    /// newest first, and whether more remain beyond them.
    pub fn get_older(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        let mut older = self.entries.range(..(timestamp, *hash)).rev();
        let hashes: Vec<VertexId> = older.by_ref().take(count).map(|(_, id)| *id).collect();
        let has_more = older.next().is_some();
        (hashes, has_more)
    }

    /// Up to `count` entries strictly newer than `(timestamp, hash)`,
    /// oldest first, and whether more remain beyond them.
    pub fn get_newer(
        &self,
        timestamp: Timestamp,
        hash: &VertexId,
        count: usize,
    ) -> (Vec<VertexId>, bool) {
        use std::ops::Bound;
        let mut newer =
            self.entries.range((Bound::Excluded((timestamp, *hash)), Bound::Unbounded));
        let hashes: Vec<VertexId> = newer.by_ref().take(count).map(|(_, id)| *id).collect();
        let has_more = newer.next().is_some();
        (hashes, has_more)
    }
}

// ── Per-kind group ───────────────────────────────────────────────────────────

/// The indexes one vertex kind maintains: tips, timestamp ordering, count.
#[derive(Debug, Default)]
pub struct IndexGroup {
    pub tips: TipsIndex,
    pub by_timestamp: TimestampIndex,
    count: usize,
}

impl IndexGroup {
    pub fn count(&self) -> usize {
        self.count
    }

    fn add(&mut self, vertex: &Vertex, id: VertexId) -> bool {
        if !self.tips.add(vertex, id) {
            return false;
        }
        self.by_timestamp.add(vertex.timestamp, id);
        self.count += 1;
        true
    }

    fn remove(&mut self, vertex: &Vertex, id: &VertexId) -> bool {
        if !self.tips.remove(vertex, id) {
            return false;
        }
        self.by_timestamp.remove(vertex.timestamp, id);
        self.count -= 1;
        true
    }
}

// ── Store-wide aggregate ─────────────────────────────────────────────────────

/// All indexes of one storage instance. Add/remove are idempotent: the tip
/// index doubles as the membership record, so repeated calls leave counts
/// untouched.
#[derive(Default)]
pub struct StoreIndexes {
    pub blocks: IndexGroup,
    pub transactions: IndexGroup,
    voided_tips: HashSet<VertexId>,
    latest_timestamp: Timestamp,
    sink: Option<Arc<dyn EventSink>>,
}

impl StoreIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an event bus for voided/un-voided notifications.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    fn group_for(&mut self, vertex: &Vertex) -> &mut IndexGroup {
        if vertex.is_block() {
            &mut self.blocks
        } else {
            &mut self.transactions
        }
    }

    pub fn add_vertex(&mut self, vertex: &Vertex, id: VertexId) -> bool {
        let added = self.group_for(vertex).add(vertex, id);
        if added {
            self.latest_timestamp = self.latest_timestamp.max(vertex.timestamp);
            debug!(vertex = %id, timestamp = vertex.timestamp, "indexed vertex");
        }
        added
    }

    pub fn remove_vertex(&mut self, vertex: &Vertex, id: &VertexId) -> bool {
        let removed = self.group_for(vertex).remove(vertex, id);
        if removed {
            self.voided_tips.remove(id);
        }
        removed
    }

    pub fn contains(&self, id: &VertexId) -> bool {
        self.blocks.tips.contains(id) || self.transactions.tips.contains(id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.count()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.count()
    }

    /// Maximum timestamp observed across all added vertices.
    pub fn latest_timestamp(&self) -> Timestamp {
        self.latest_timestamp
    }

    /// Block tips as of `timestamp` (defaults to the latest observed).
    pub fn block_tips(&self, timestamp: Option<Timestamp>) -> HashSet<VertexId> {
        self.blocks.tips.tips_at(timestamp.unwrap_or(self.latest_timestamp))
    }

    /// Transaction tips as of `timestamp` (defaults to the latest observed).
    pub fn transaction_tips(&self, timestamp: Option<Timestamp>) -> HashSet<VertexId> {
        self.transactions.tips.tips_at(timestamp.unwrap_or(self.latest_timestamp))
    }

    pub fn voided_tips(&self) -> &HashSet<VertexId> {
        &self.voided_tips
    }

    pub fn mark_voided(&mut self, id: VertexId) {
        if self.voided_tips.insert(id) {
            if let Some(sink) = &self.sink {
                sink.publish(StorageEvent::VertexVoided(id));
            }
        }
    }

    pub fn unmark_voided(&mut self, id: &VertexId) {
        if self.voided_tips.remove(id) {
            if let Some(sink) = &self.sink {
                sink.publish(StorageEvent::VertexUnvoided(*id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_dag::{TxOutput, VertexKind};
    use std::sync::Mutex;

    fn vid(byte: u8) -> VertexId {
        VertexId::from_bytes([byte; 32])
    }

    fn tx(timestamp: Timestamp, parents: Vec<VertexId>) -> (Vertex, VertexId) {
        let mut tx = Vertex::new(VertexKind::Transaction, timestamp);
        tx.weight = 1.0;
        tx.outputs.push(TxOutput::new(1, vec![0x51]));
        tx.parents = parents;
        tx.update_hash();
        let id = tx.id().unwrap();
        (tx, id)
    }

    fn block(timestamp: Timestamp) -> (Vertex, VertexId) {
        let mut b = Vertex::new(VertexKind::Block, timestamp);
        b.weight = 1.0;
        b.outputs.push(TxOutput::new(2000, vec![0x51]));
        b.update_hash();
        let id = b.id().unwrap();
        (b, id)
    }

    #[test]
    fn child_closes_parent_tip_interval() {
        let mut idx = StoreIndexes::new();
        let (t1, h1) = tx(100, vec![]);
        let (t2, h2) = tx(101, vec![]);
        idx.add_vertex(&t1, h1);
        idx.add_vertex(&t2, h2);
        assert_eq!(idx.transaction_tips(None), [h1, h2].into_iter().collect());

        let (child, ch) = tx(200, vec![h1, h2]);
        idx.add_vertex(&child, ch);
        assert_eq!(idx.transaction_tips(None), [ch].into_iter().collect());
        // As of a time before the child existed, the parents were tips.
        assert_eq!(idx.transaction_tips(Some(150)), [h1, h2].into_iter().collect());
    }

    #[test]
    fn add_is_idempotent_for_counts() {
        let mut idx = StoreIndexes::new();
        let (b, h) = block(100);
        assert!(idx.add_vertex(&b, h));
        assert!(!idx.add_vertex(&b, h));
        assert_eq!(idx.block_count(), 1);
        assert_eq!(idx.transaction_count(), 0);
    }

    #[test]
    fn remove_reverts_count_and_interval() {
        let mut idx = StoreIndexes::new();
        let (t1, h1) = tx(100, vec![]);
        let (child, ch) = tx(200, vec![h1]);
        idx.add_vertex(&t1, h1);
        idx.add_vertex(&child, ch);
        assert!(idx.remove_vertex(&child, &ch));
        assert!(!idx.remove_vertex(&child, &ch));
        assert_eq!(idx.transaction_count(), 1);
        assert_eq!(idx.transaction_tips(Some(300)), [h1].into_iter().collect());
    }

    #[test]
    fn latest_timestamp_tracks_maximum() {
        let mut idx = StoreIndexes::new();
        let (t1, h1) = tx(500, vec![]);
        let (t2, h2) = tx(300, vec![]);
        idx.add_vertex(&t1, h1);
        idx.add_vertex(&t2, h2);
        assert_eq!(idx.latest_timestamp(), 500);
    }

    #[test]
    fn newest_older_newer_pagination() {
        let mut ts = TimestampIndex::default();
        let ids: Vec<VertexId> = (1..=5).map(vid).collect();
        for (i, id) in ids.iter().enumerate() {
            ts.add(100 + i as Timestamp, *id);
        }

        let (newest, has_more) = ts.get_newest(2);
        assert_eq!(newest, vec![ids[4], ids[3]]);
        assert!(has_more);

        let (older, has_more) = ts.get_older(103, &ids[3], 2);
        assert_eq!(older, vec![ids[2], ids[1]]);
        assert!(has_more);

        let (newer, has_more) = ts.get_newer(103, &ids[3], 5);
        assert_eq!(newer, vec![ids[4]]);
        assert!(!has_more);
    }

    #[test]
    fn voided_marks_publish_events() {
        struct Recorder(Mutex<Vec<StorageEvent>>);
        impl EventSink for Recorder {
            fn publish(&self, event: StorageEvent) {
                self.0.lock().unwrap().push(event);
            }
        }

        let sink = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut idx = StoreIndexes::new().with_sink(sink.clone());
        let id = vid(9);
        idx.mark_voided(id);
        idx.mark_voided(id); // repeat is silent
        idx.unmark_voided(&id);
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![StorageEvent::VertexVoided(id), StorageEvent::VertexUnvoided(id)]
        );
        assert!(idx.voided_tips().is_empty());
    }
}
