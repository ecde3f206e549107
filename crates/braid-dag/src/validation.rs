use braid_core::constants::MAX_DISTANCE_BETWEEN_BLOCKS;
use braid_core::error::BraidError;
use braid_core::types::{Timestamp, VertexId};
use std::collections::HashSet;

use crate::vertex::Vertex;

/// Validate the parent structure of a candidate vertex before acceptance.
///
/// Checks (in order):
/// 1. No duplicate parent hashes
/// 2. Every parent exists (caller provides the lookup) and has a strictly
///    smaller timestamp
/// 3. Parents are ordered block-first: after the first transaction parent,
///    no block parent may appear
/// 4. Block-to-block distance stays within `MAX_DISTANCE_BETWEEN_BLOCKS`
///    (genesis excepted)
/// 5. No transaction parent is older than the oldest state a sibling block
///    parent already confirms
/// 6. Parent counts match the variant exactly (block: 1 block + 2 tx;
///    transaction: 2 tx)
///
/// The lookup is a plain closure so the authoritative store, a
/// verification snapshot, or a test map can back it interchangeably.
pub fn verify_parents<F>(vertex: &Vertex, lookup: F) -> Result<(), BraidError>
where
    F: Fn(&VertexId) -> Option<Vertex>,
{
    let own_hex = vertex.hash().map(|h| h.to_hex()).unwrap_or_else(|| "<unhashed>".into());

    let mut seen: HashSet<&VertexId> = HashSet::with_capacity(vertex.parents.len());
    for parent_hash in &vertex.parents {
        if !seen.insert(parent_hash) {
            return Err(BraidError::DuplicatedParents(own_hex));
        }
    }

    let mut block_parents = 0usize;
    let mut tx_parents = 0usize;
    // Minimum timestamp among the non-block parents of the block parents
    // scanned so far. A transaction parent older than this would let the
    // vertex confirm a state older than what its sibling block confirms.
    let mut min_timestamp: Option<Timestamp> = None;

    for parent_hash in &vertex.parents {
        let parent = lookup(parent_hash).ok_or_else(|| BraidError::ParentDoesNotExist {
            vertex: own_hex.clone(),
            parent: parent_hash.to_hex(),
        })?;

        if vertex.timestamp <= parent.timestamp {
            return Err(BraidError::TimestampError(format!(
                "vertex={} timestamp={} <= parent={} timestamp={}",
                own_hex,
                vertex.timestamp,
                parent_hash.to_hex(),
                parent.timestamp,
            )));
        }

        if parent.is_block() {
            if tx_parents > 0 {
                return Err(BraidError::IncorrectParents {
                    expected_blocks: vertex.kind.expected_block_parents(),
                    expected_txs: vertex.kind.expected_tx_parents(),
                    got_blocks: block_parents + 1,
                    got_txs: tx_parents,
                });
            }
            block_parents += 1;

            if vertex.is_block() && !parent.is_genesis() {
                let distance = vertex.timestamp - parent.timestamp;
                if distance > MAX_DISTANCE_BETWEEN_BLOCKS {
                    return Err(BraidError::TimestampError(format!(
                        "distance between blocks is too big: {distance} > {MAX_DISTANCE_BETWEEN_BLOCKS}",
                    )));
                }
            }

            for grandparent_hash in &parent.parents {
                let grandparent =
                    lookup(grandparent_hash).ok_or_else(|| BraidError::ParentDoesNotExist {
                        vertex: parent_hash.to_hex(),
                        parent: grandparent_hash.to_hex(),
                    })?;
                if !grandparent.is_block() {
                    min_timestamp = Some(match min_timestamp {
                        Some(current) => current.min(grandparent.timestamp),
                        None => grandparent.timestamp,
                    });
                }
            }
        } else {
            tx_parents += 1;
            if let Some(min) = min_timestamp {
                if parent.timestamp < min {
                    return Err(BraidError::TimestampError(format!(
                        "tx parent {} timestamp={} is older than the state confirmed by a sibling block (min={min})",
                        parent_hash.to_hex(),
                        parent.timestamp,
                    )));
                }
            }
        }
    }

    let expected_blocks = vertex.kind.expected_block_parents();
    let expected_txs = vertex.kind.expected_tx_parents();
    if block_parents != expected_blocks || tx_parents != expected_txs {
        return Err(BraidError::IncorrectParents {
            expected_blocks,
            expected_txs,
            got_blocks: block_parents,
            got_txs: tx_parents,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::{TxOutput, VertexKind};
    use std::collections::HashMap;

    struct Dag {
        vertices: HashMap<VertexId, Vertex>,
    }

    impl Dag {
        fn new() -> Self {
            Self { vertices: HashMap::new() }
        }

        fn insert(&mut self, vertex: Vertex) -> VertexId {
            let id = vertex.id().unwrap();
            self.vertices.insert(id, vertex);
            id
        }

        fn lookup(&self) -> impl Fn(&VertexId) -> Option<Vertex> + '_ {
            |id| self.vertices.get(id).cloned()
        }
    }

    fn make_tx(timestamp: u32, parents: Vec<VertexId>) -> Vertex {
        let mut tx = Vertex::new(VertexKind::Transaction, timestamp);
        tx.weight = 1.0;
        tx.outputs.push(TxOutput::new(1, vec![0x51]));
        tx.parents = parents;
        tx.update_hash();
        tx
    }

    fn make_block(timestamp: u32, parents: Vec<VertexId>) -> Vertex {
        let mut block = Vertex::new(VertexKind::Block, timestamp);
        block.weight = 1.0;
        block.outputs.push(TxOutput::new(2000, vec![0x51]));
        block.parents = parents;
        block.update_hash();
        block
    }

    /// Genesis-like base: one block and two transactions, no parents.
    fn base_dag() -> (Dag, VertexId, VertexId, VertexId) {
        let mut dag = Dag::new();
        let b = dag.insert(make_block(1000, vec![]));
        let t1 = dag.insert(make_tx(1001, vec![]));
        let t2 = dag.insert(make_tx(1002, vec![]));
        (dag, b, t1, t2)
    }

    #[test]
    fn valid_transaction_parents() {
        let (dag, _b, t1, t2) = base_dag();
        let tx = make_tx(2000, vec![t1, t2]);
        assert!(verify_parents(&tx, dag.lookup()).is_ok());
    }

    #[test]
    fn valid_block_parents_block_first() {
        let (dag, b, t1, t2) = base_dag();
        let block = make_block(1060, vec![b, t1, t2]);
        assert!(verify_parents(&block, dag.lookup()).is_ok());
    }

    #[test]
    fn duplicated_parents_rejected() {
        let (dag, _b, t1, _t2) = base_dag();
        let tx = make_tx(2000, vec![t1, t1]);
        assert!(matches!(verify_parents(&tx, dag.lookup()), Err(BraidError::DuplicatedParents(_))));
    }

    #[test]
    fn missing_parent_rejected() {
        let (dag, _b, t1, _t2) = base_dag();
        let tx = make_tx(2000, vec![t1, VertexId::from_bytes([0xee; 32])]);
        assert!(matches!(
            verify_parents(&tx, dag.lookup()),
            Err(BraidError::ParentDoesNotExist { .. })
        ));
    }

    #[test]
    fn parent_timestamp_must_be_smaller() {
        let (dag, _b, t1, t2) = base_dag();
        let tx = make_tx(1002, vec![t1, t2]); // equal to t2's timestamp
        assert!(matches!(verify_parents(&tx, dag.lookup()), Err(BraidError::TimestampError(_))));
    }

    #[test]
    fn block_after_tx_parent_rejected() {
        let (dag, b, t1, t2) = base_dag();
        let block = make_block(1060, vec![t1, t2, b]);
        assert!(matches!(
            verify_parents(&block, dag.lookup()),
            Err(BraidError::IncorrectParents { .. })
        ));
    }

    #[test]
    fn transaction_may_not_confirm_a_block() {
        let (dag, b, t1, _t2) = base_dag();
        let tx = make_tx(2000, vec![b, t1]);
        assert!(matches!(
            verify_parents(&tx, dag.lookup()),
            Err(BraidError::IncorrectParents { .. })
        ));
    }

    #[test]
    fn wrong_parent_count_rejected() {
        let (dag, _b, t1, _t2) = base_dag();
        let tx = make_tx(2000, vec![t1]);
        assert!(matches!(
            verify_parents(&tx, dag.lookup()),
            Err(BraidError::IncorrectParents { .. })
        ));
    }

    #[test]
    fn excessive_block_distance_rejected() {
        let (mut dag, b, t1, t2) = base_dag();
        // First block beyond genesis, well within distance.
        let b1 = dag.insert(make_block(1060, vec![b, t1, t2]));
        // Second block much too far from its block parent.
        let too_far = 1060 + MAX_DISTANCE_BETWEEN_BLOCKS + 1;
        let block = make_block(too_far, vec![b1, t1, t2]);
        assert!(matches!(verify_parents(&block, dag.lookup()), Err(BraidError::TimestampError(_))));
    }

    #[test]
    fn genesis_block_parent_exempt_from_distance() {
        let (dag, b, t1, t2) = base_dag();
        let far = 1000 + MAX_DISTANCE_BETWEEN_BLOCKS * 10;
        let block = make_block(far, vec![b, t1, t2]);
        assert!(verify_parents(&block, dag.lookup()).is_ok());
    }

    #[test]
    fn tx_parent_older_than_sibling_block_state_rejected() {
        let (mut dag, b, t1, t2) = base_dag();
        let old_tx = dag.insert(make_tx(1001, vec![]));
        // A block confirming t1/t2 pins min confirmed tx timestamp at 1001.
        let newer_t1 = dag.insert(make_tx(1500, vec![t1, t2]));
        let newer_t2 = dag.insert(make_tx(1501, vec![t1, t2]));
        let b1 = dag.insert(make_block(1550, vec![b, newer_t1, newer_t2]));

        // Candidate block lists b1 then a tx older than 1500.
        let candidate = make_block(1600, vec![b1, old_tx, newer_t1]);
        assert!(matches!(
            verify_parents(&candidate, dag.lookup()),
            Err(BraidError::TimestampError(_))
        ));

        let fine = make_block(1600, vec![b1, newer_t1, newer_t2]);
        assert!(verify_parents(&fine, dag.lookup()).is_ok());
    }
}
