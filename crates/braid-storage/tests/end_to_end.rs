//! Full lifecycle: genesis, mining, validation, acceptance, height index,
//! and on-disk persistence, driven through the public API only.

use braid_dag::codec;
use braid_dag::{verify_parents, TxOutput, Vertex, VertexKind};
use braid_genesis::{genesis_block, genesis_vertices};
use braid_storage::{
    accept_vertex, BlockHeightIndex, JsonStore, MemoryStore, NoHooks, VertexStore,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn mine_and_accept_a_transaction_and_block() {
    init_tracing();

    let mut store = MemoryStore::new();
    let genesis_id = genesis_block().id().unwrap();
    let mut heights = BlockHeightIndex::new(genesis_id);
    assert_eq!(heights.get_height_tip(), (0, genesis_id));

    let [b, t1, t2] = genesis_vertices();
    let (t1_id, t2_id) = (t1.id().unwrap(), t2.id().unwrap());

    // Mine a transaction confirming the two genesis transactions.
    let mut tx = Vertex::new(VertexKind::Transaction, t2.timestamp + 10);
    tx.weight = 1.0;
    tx.outputs.push(TxOutput::new(100, vec![0x51]));
    tx.parents = vec![t1_id, t2_id];
    assert!(tx.resolve(), "weight-1 search must find a nonce");

    tx.verify_pow().unwrap();
    verify_parents(&tx, |id| store.get(id).ok()).unwrap();

    // Canonical bytes survive a round trip, hash included.
    let decoded = codec::decode(&tx.encode()).unwrap();
    assert_eq!(decoded, tx);
    assert_eq!(decoded.hash(), tx.hash());

    let tx_id = accept_vertex(&mut store, &mut heights, &tx, &mut NoHooks).unwrap();
    assert_eq!(store.transaction_count(), 3);
    assert!(store.transaction_tips(None).contains(&tx_id));

    // Mine a block on top: block parent first, then two transactions.
    let mut block = Vertex::new(VertexKind::Block, tx.timestamp + 10);
    block.weight = 1.0;
    block.height = 1;
    block.outputs.push(TxOutput::new(2000, vec![0x51]));
    block.parents = vec![b.id().unwrap(), tx_id, t1_id];
    assert!(block.resolve());

    let block_id = accept_vertex(&mut store, &mut heights, &block, &mut NoHooks).unwrap();
    assert_eq!(heights.get_height_tip(), (1, block_id));
    assert_eq!(store.block_count(), 2);
    assert!(store.block_tips(None).contains(&block_id));

    // The accepted descendants raised the genesis transactions' scores.
    let meta = store.get_metadata(&t1_id).unwrap();
    assert!(meta.children.contains(&tx_id));
    assert!(meta.accumulated_weight > t1.weight);
}

#[test]
fn sighash_survives_remining() {
    init_tracing();

    let [_, t1, t2] = genesis_vertices();
    let mut tx = Vertex::new(VertexKind::Transaction, t2.timestamp + 10);
    tx.weight = 1.0;
    tx.outputs.push(TxOutput::new(100, vec![0x51]));
    tx.parents = vec![t1.id().unwrap(), t2.id().unwrap()];
    assert!(tx.resolve());
    let original_sighash = tx.sighash_bytes();

    // Remine with different weight, parents order, and timestamp.
    let mut remined = tx.clone();
    remined.weight = 2.0;
    remined.timestamp += 50;
    remined.parents = vec![t2.id().unwrap(), t1.id().unwrap()];
    assert!(remined.resolve());

    assert_ne!(remined.hash(), tx.hash());
    assert_eq!(remined.sighash_bytes(), original_sighash);
}

#[test]
fn json_store_runs_the_same_pipeline() {
    init_tracing();

    let dir = tempfile::TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let mut heights = BlockHeightIndex::new(genesis_block().id().unwrap());

    let [b, t1, t2] = genesis_vertices();
    let mut tx = Vertex::new(VertexKind::Transaction, t2.timestamp + 10);
    tx.weight = 1.0;
    tx.outputs.push(TxOutput::new(100, vec![0x51]));
    tx.parents = vec![t1.id().unwrap(), t2.id().unwrap()];
    assert!(tx.resolve());
    let tx_id = accept_vertex(&mut store, &mut heights, &tx, &mut NoHooks).unwrap();

    let mut block = Vertex::new(VertexKind::Block, tx.timestamp + 10);
    block.weight = 1.0;
    block.height = 1;
    block.outputs.push(TxOutput::new(2000, vec![0x51]));
    block.parents = vec![b.id().unwrap(), tx_id, t1.id().unwrap()];
    assert!(block.resolve());
    let block_id = accept_vertex(&mut store, &mut heights, &block, &mut NoHooks).unwrap();

    assert_eq!(store.blocks_at_height(1).unwrap(), vec![block_id]);

    // Reopen from disk: vertices and rebuilt indexes line up.
    drop(store);
    let reopened = JsonStore::open(dir.path()).unwrap();
    assert_eq!(reopened.transaction_count(), 3);
    assert_eq!(reopened.block_count(), 2);
    assert_eq!(reopened.get(&tx_id).unwrap(), tx);
    assert_eq!(reopened.get(&block_id).unwrap(), block);
}
