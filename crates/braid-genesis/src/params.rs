use braid_core::constants::MIN_WEIGHT;
use braid_core::types::Timestamp;

/// Timestamp of the genesis block (2018-10-11 15:24:41 UTC).
pub const GENESIS_BLOCK_TIMESTAMP: Timestamp = 1_539_271_481;
/// Timestamps of the two genesis transactions, one and two seconds later.
pub const GENESIS_TX1_TIMESTAMP: Timestamp = GENESIS_BLOCK_TIMESTAMP + 1;
pub const GENESIS_TX2_TIMESTAMP: Timestamp = GENESIS_BLOCK_TIMESTAMP + 2;

/// All three genesis vertices carry the network weight floor.
pub const GENESIS_WEIGHT: f64 = MIN_WEIGHT;

/// Fixed nonces. Genesis vertices are the founding document: they are never
/// re-verified against the proof-of-work gate, so these only pin the hashes.
pub const GENESIS_BLOCK_NONCE: u32 = 47_477;
pub const GENESIS_TX1_NONCE: u32 = 19_300;
pub const GENESIS_TX2_NONCE: u32 = 22_587;

/// The premine output on the genesis block.
pub const GENESIS_OUTPUT_VALUE: u32 = 1000;

/// P2PKH locking script of the premine output.
pub const GENESIS_OUTPUT_SCRIPT: [u8; 25] = [
    0x76, 0xa9, 0x14, 0x98, 0xf1, 0x2b, 0x65, 0x93, 0x36, 0xa1, 0x87, 0x4d, 0xdb, 0xae, 0x37,
    0x83, 0x7f, 0xa8, 0xa3, 0x9f, 0x66, 0xb5, 0x3d, 0x88, 0xac,
];
