//! braid-storage
//!
//! Persistence and indexing for the vertex DAG: the [`VertexStore`]
//! contract, three interchangeable backends (memory, JSON files, sled),
//! the block-height index, graph traversals, verification snapshots, a
//! deferred async wrapper, and the acceptance pipeline that ties them
//! together.

pub mod deferred;
pub mod events;
pub mod height_index;
pub mod indexes;
pub mod json_store;
pub mod memory;
pub mod pipeline;
pub mod sled_store;
pub mod snapshot;
pub mod store;
pub mod traversal;

pub use deferred::DeferredStore;
pub use events::{EventSink, StorageEvent};
pub use height_index::BlockHeightIndex;
pub use indexes::StoreIndexes;
pub use json_store::JsonStore;
pub use memory::MemoryStore;
pub use pipeline::{accept_vertex, AcceptanceHooks, NoHooks};
pub use sled_store::SledStore;
pub use snapshot::SnapshotStore;
pub use store::VertexStore;
