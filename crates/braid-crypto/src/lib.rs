pub mod hash;
pub mod pow;

pub use hash::{finish_hash, partial_hash, vertex_hash};
pub use pow::{meets_target, pow_target};
