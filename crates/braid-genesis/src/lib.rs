//! braid-genesis
//!
//! Builds the three founding vertices of the DAG: one block carrying the
//! premine output and two empty transactions. Genesis vertices have no
//! parents and skip the normal admission path (no structural validation,
//! no proof-of-work gate) — they are written directly by each storage
//! backend when it opens.
//!
//! Construction is fully deterministic, so the hashes act as network
//! identity: two stores agree on the chain iff they agree on these three
//! hashes.

pub mod params;

use braid_dag::{TxOutput, Vertex, VertexKind};
use once_cell::sync::OnceCell;

use params::{
    GENESIS_BLOCK_NONCE, GENESIS_BLOCK_TIMESTAMP, GENESIS_OUTPUT_SCRIPT, GENESIS_OUTPUT_VALUE,
    GENESIS_TX1_NONCE, GENESIS_TX1_TIMESTAMP, GENESIS_TX2_NONCE, GENESIS_TX2_TIMESTAMP,
    GENESIS_WEIGHT,
};

/// The genesis block: height 0, premine output, no parents.
pub fn genesis_block() -> Vertex {
    let mut block = Vertex::new(VertexKind::Block, GENESIS_BLOCK_TIMESTAMP);
    block.nonce = GENESIS_BLOCK_NONCE;
    block.weight = GENESIS_WEIGHT;
    block.height = 0;
    block.outputs.push(TxOutput::new(GENESIS_OUTPUT_VALUE, GENESIS_OUTPUT_SCRIPT.to_vec()));
    block.update_hash();
    block
}

/// The first genesis transaction: empty, one second after the block.
pub fn genesis_tx1() -> Vertex {
    let mut tx = Vertex::new(VertexKind::Transaction, GENESIS_TX1_TIMESTAMP);
    tx.nonce = GENESIS_TX1_NONCE;
    tx.weight = GENESIS_WEIGHT;
    tx.update_hash();
    tx
}

/// The second genesis transaction: empty, two seconds after the block.
pub fn genesis_tx2() -> Vertex {
    let mut tx = Vertex::new(VertexKind::Transaction, GENESIS_TX2_TIMESTAMP);
    tx.nonce = GENESIS_TX2_NONCE;
    tx.weight = GENESIS_WEIGHT;
    tx.update_hash();
    tx
}

/// All three genesis vertices, block first. Built once per process.
pub fn genesis_vertices() -> &'static [Vertex; 3] {
    static GENESIS: OnceCell<[Vertex; 3]> = OnceCell::new();
    GENESIS.get_or_init(|| [genesis_block(), genesis_tx1(), genesis_tx2()])
}
