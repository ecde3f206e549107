//! Embedded-DB backend on sled (pure Rust, no C dependencies).
//!
//! Named trees:
//!   vertices         — hash bytes      → canonical codec bytes
//!   metadata         — hash bytes      → bincode(VertexMetadata)
//!   blocks_by_height — height BE bytes → bincode(Vec<VertexId>)
//!
//! Vertices are stored in the canonical wire encoding, so every read goes
//! through the codec's hash recomputation: a record whose bytes no longer
//! hash to its key is surfaced as corruption, not returned.

use braid_core::error::BraidError;
use braid_core::types::{Height, VertexId};
use braid_dag::{codec, Vertex, VertexMetadata};
use braid_genesis::genesis_vertices;
use std::path::Path;
use tracing::info;

use crate::indexes::StoreIndexes;
use crate::store::VertexStore;

pub struct SledStore {
    _db: sled::Db,
    vertices: sled::Tree,
    metadata: sled::Tree,
    blocks_by_height: sled::Tree,
    indexes: StoreIndexes,
}

fn storage_err(e: sled::Error) -> BraidError {
    BraidError::Storage(e.to_string())
}

impl SledStore {
    /// Open or create the database at `path`. An empty database is seeded
    /// with the genesis vertices; an existing one gets its in-memory
    /// indexes rebuilt.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BraidError> {
        let db = sled::open(path).map_err(storage_err)?;
        let vertices = db.open_tree("vertices").map_err(storage_err)?;
        let metadata = db.open_tree("metadata").map_err(storage_err)?;
        let blocks_by_height = db.open_tree("blocks_by_height").map_err(storage_err)?;
        let mut store =
            Self { _db: db, vertices, metadata, blocks_by_height, indexes: StoreIndexes::new() };

        if store.vertices.is_empty() {
            info!("initializing fresh sled store");
            for vertex in genesis_vertices() {
                store.save(vertex, false)?;
                store.add_to_indexes(vertex)?;
            }
        } else {
            store.rebuild_indexes()?;
        }
        Ok(store)
    }

    /// All block hashes recorded at `height` (competing branches included).
    pub fn blocks_at_height(&self, height: Height) -> Result<Vec<VertexId>, BraidError> {
        match self.blocks_by_height.get(height.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| BraidError::Serialization(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn append_to_height_bucket(&self, height: Height, id: &VertexId) -> Result<(), BraidError> {
        let mut hashes = self.blocks_at_height(height)?;
        if hashes.contains(id) {
            return Ok(());
        }
        hashes.push(*id);
        let bytes =
            bincode::serialize(&hashes).map_err(|e| BraidError::Serialization(e.to_string()))?;
        self.blocks_by_height.insert(height.to_be_bytes(), bytes).map_err(storage_err)?;
        Ok(())
    }

    fn decode_record(key: &[u8], bytes: &[u8]) -> Result<Vertex, BraidError> {
        let vertex = codec::decode(bytes)?;
        let computed = vertex.id()?;
        if computed.as_bytes() != key {
            return Err(BraidError::HashMismatch {
                stored: hex::encode(key),
                computed: computed.to_hex(),
            });
        }
        Ok(vertex)
    }
}

impl VertexStore for SledStore {
    fn save(&mut self, vertex: &Vertex, only_metadata: bool) -> Result<(), BraidError> {
        let id = vertex.id()?;
        if !only_metadata {
            self.vertices.insert(id.as_bytes(), vertex.encode()).map_err(storage_err)?;
            if vertex.is_block() {
                self.append_to_height_bucket(vertex.height, &id)?;
            }
        }
        if !self.metadata.contains_key(id.as_bytes()).map_err(storage_err)? {
            self.save_metadata(&VertexMetadata::new(id))?;
        }
        Ok(())
    }

    fn contains(&self, id: &VertexId) -> bool {
        self.vertices.contains_key(id.as_bytes()).unwrap_or(false)
    }

    fn get(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        match self.vertices.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Self::decode_record(id.as_bytes(), &bytes),
            None => Err(BraidError::VertexDoesNotExist(id.to_hex())),
        }
    }

    fn get_metadata(&self, id: &VertexId) -> Result<VertexMetadata, BraidError> {
        match self.metadata.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| BraidError::Serialization(e.to_string())),
            None => Err(BraidError::MetadataDoesNotExist(id.to_hex())),
        }
    }

    fn save_metadata(&mut self, metadata: &VertexMetadata) -> Result<(), BraidError> {
        let bytes =
            bincode::serialize(metadata).map_err(|e| BraidError::Serialization(e.to_string()))?;
        self.metadata.insert(metadata.hash.as_bytes(), bytes).map_err(storage_err)?;
        Ok(())
    }

    fn all_vertices(&self) -> Result<Vec<Vertex>, BraidError> {
        let mut all = Vec::new();
        for entry in self.vertices.iter() {
            let (key, bytes) = entry.map_err(storage_err)?;
            all.push(Self::decode_record(&key, &bytes)?);
        }
        Ok(all)
    }

    fn indexes(&self) -> &StoreIndexes {
        &self.indexes
    }

    fn indexes_mut(&mut self) -> &mut StoreIndexes {
        &mut self.indexes
    }
}
