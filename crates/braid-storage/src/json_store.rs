//! File-per-vertex JSON backend.
//!
//! Layout under the configured directory: `tx_<hex>.json` (full vertex),
//! `tx_<hex>_metadata.json` (metadata document), and per-height buckets
//! `blks_h_<height>.json` holding a JSON array of hex hashes — multiple
//! competing blocks may share a height until a reorg resolves them.
//!
//! Hashes are hex and binary payloads (scripts, input data) base64 in every
//! document. Loading a vertex recomputes its hash and refuses to return a
//! record whose bytes no longer produce the filename hash.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use braid_core::error::BraidError;
use braid_core::types::{Height, TokenUid, VertexId};
use braid_dag::{TxInput, TxOutput, Vertex, VertexKind, VertexMetadata};
use braid_genesis::genesis_vertices;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::indexes::StoreIndexes;
use crate::store::VertexStore;

pub struct JsonStore {
    dir: PathBuf,
    indexes: StoreIndexes,
}

impl JsonStore {
    /// Open (or initialize) a store rooted at `dir`. Missing genesis
    /// vertices are written, then the indexes are rebuilt from every
    /// vertex file on disk — so a directory holding vertices from an
    /// earlier run is fully indexed even if its genesis files were lost.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, BraidError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| BraidError::Storage(e.to_string()))?;
        let mut store = Self { dir, indexes: StoreIndexes::new() };

        let genesis = genesis_vertices();
        let seeded = genesis[0].hash().map(|id| store.contains(id)).unwrap_or(false);
        if !seeded {
            info!(dir = %store.dir.display(), "seeding genesis vertices");
            for vertex in genesis {
                store.save(vertex, false)?;
            }
        }
        store.rebuild_indexes()?;
        Ok(store)
    }

    fn vertex_path(&self, id: &VertexId) -> PathBuf {
        self.dir.join(format!("tx_{}.json", id.to_hex()))
    }

    fn metadata_path(&self, id: &VertexId) -> PathBuf {
        self.dir.join(format!("tx_{}_metadata.json", id.to_hex()))
    }

    fn height_path(&self, height: Height) -> PathBuf {
        self.dir.join(format!("blks_h_{height}.json"))
    }

    /// All block hashes recorded at `height` (competing branches included).
    pub fn blocks_at_height(&self, height: Height) -> Result<Vec<VertexId>, BraidError> {
        let path = self.height_path(height);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path).map_err(|e| BraidError::Storage(e.to_string()))?;
        let hexes: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| BraidError::Serialization(e.to_string()))?;
        hexes
            .iter()
            .map(|h| {
                VertexId::from_hex(h)
                    .map_err(|e| BraidError::InvalidBytes(format!("height bucket hash: {e}")))
            })
            .collect()
    }

    fn append_to_height_bucket(&self, height: Height, id: &VertexId) -> Result<(), BraidError> {
        let mut hashes = self.blocks_at_height(height)?;
        if hashes.contains(id) {
            return Ok(());
        }
        hashes.push(*id);
        let hexes: Vec<String> = hashes.iter().map(|h| h.to_hex()).collect();
        let raw = serde_json::to_string(&hexes)
            .map_err(|e| BraidError::Serialization(e.to_string()))?;
        fs::write(self.height_path(height), raw).map_err(|e| BraidError::Storage(e.to_string()))
    }
}

impl VertexStore for JsonStore {
    fn save(&mut self, vertex: &Vertex, only_metadata: bool) -> Result<(), BraidError> {
        let id = vertex.id()?;
        if !only_metadata {
            let doc = VertexDoc::from_vertex(vertex, &id);
            let raw = serde_json::to_string_pretty(&doc)
                .map_err(|e| BraidError::Serialization(e.to_string()))?;
            fs::write(self.vertex_path(&id), raw)
                .map_err(|e| BraidError::Storage(e.to_string()))?;
            if vertex.is_block() {
                self.append_to_height_bucket(vertex.height, &id)?;
            }
        }
        if !self.metadata_path(&id).exists() {
            self.save_metadata(&VertexMetadata::new(id))?;
        }
        Ok(())
    }

    fn contains(&self, id: &VertexId) -> bool {
        self.vertex_path(id).exists()
    }

    fn get(&self, id: &VertexId) -> Result<Vertex, BraidError> {
        let path = self.vertex_path(id);
        if !path.exists() {
            return Err(BraidError::VertexDoesNotExist(id.to_hex()));
        }
        let raw = fs::read_to_string(&path).map_err(|e| BraidError::Storage(e.to_string()))?;
        let doc: VertexDoc =
            serde_json::from_str(&raw).map_err(|e| BraidError::Serialization(e.to_string()))?;
        doc.into_vertex(id)
    }

    fn get_metadata(&self, id: &VertexId) -> Result<VertexMetadata, BraidError> {
        let path = self.metadata_path(id);
        if !path.exists() {
            return Err(BraidError::MetadataDoesNotExist(id.to_hex()));
        }
        let raw = fs::read_to_string(&path).map_err(|e| BraidError::Storage(e.to_string()))?;
        let doc: MetadataDoc =
            serde_json::from_str(&raw).map_err(|e| BraidError::Serialization(e.to_string()))?;
        doc.into_metadata()
    }

    fn save_metadata(&mut self, metadata: &VertexMetadata) -> Result<(), BraidError> {
        let doc = MetadataDoc::from_metadata(metadata);
        let raw = serde_json::to_string_pretty(&doc)
            .map_err(|e| BraidError::Serialization(e.to_string()))?;
        fs::write(self.metadata_path(&metadata.hash), raw)
            .map_err(|e| BraidError::Storage(e.to_string()))
    }

    fn all_vertices(&self) -> Result<Vec<Vertex>, BraidError> {
        let mut vertices = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| BraidError::Storage(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| BraidError::Storage(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(hex) = name.strip_prefix("tx_").and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if hex.ends_with("_metadata") {
                continue;
            }
            let id = VertexId::from_hex(hex)
                .map_err(|e| BraidError::InvalidBytes(format!("vertex filename: {e}")))?;
            vertices.push(self.get(&id)?);
        }
        Ok(vertices)
    }

    fn indexes(&self) -> &StoreIndexes {
        &self.indexes
    }

    fn indexes_mut(&mut self) -> &mut StoreIndexes {
        &mut self.indexes
    }
}

// ── Documents ────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct InputDoc {
    tx_id: String,
    index: u8,
    data: String,
}

#[derive(Serialize, Deserialize)]
struct OutputDoc {
    value: u32,
    token_data: u8,
    script: String,
}

#[derive(Serialize, Deserialize)]
struct VertexDoc {
    #[serde(rename = "type")]
    kind: String,
    nonce: u32,
    timestamp: u32,
    weight: f64,
    height: u64,
    parents: Vec<String>,
    tokens: Vec<String>,
    inputs: Vec<InputDoc>,
    outputs: Vec<OutputDoc>,
    hash: String,
}

impl VertexDoc {
    fn from_vertex(vertex: &Vertex, id: &VertexId) -> Self {
        Self {
            kind: if vertex.is_block() { "block".into() } else { "transaction".into() },
            nonce: vertex.nonce,
            timestamp: vertex.timestamp,
            weight: vertex.weight,
            height: vertex.height,
            parents: vertex.parents.iter().map(|p| p.to_hex()).collect(),
            tokens: vertex.tokens.iter().map(|t| t.to_hex()).collect(),
            inputs: vertex
                .inputs
                .iter()
                .map(|i| InputDoc {
                    tx_id: i.tx_id.to_hex(),
                    index: i.index,
                    data: BASE64.encode(&i.data),
                })
                .collect(),
            outputs: vertex
                .outputs
                .iter()
                .map(|o| OutputDoc {
                    value: o.value,
                    token_data: o.token_data,
                    script: BASE64.encode(&o.script),
                })
                .collect(),
            hash: id.to_hex(),
        }
    }

    /// Rebuild the vertex and verify its recomputed hash against the id the
    /// caller asked for.
    fn into_vertex(self, expected: &VertexId) -> Result<Vertex, BraidError> {
        let kind = match self.kind.as_str() {
            "block" => VertexKind::Block,
            "transaction" => VertexKind::Transaction,
            other => {
                return Err(BraidError::InvalidBytes(format!("unknown vertex type {other:?}")))
            }
        };
        let mut vertex = Vertex::new(kind, self.timestamp);
        vertex.nonce = self.nonce;
        vertex.weight = self.weight;
        vertex.height = self.height;
        for p in &self.parents {
            vertex.parents.push(
                VertexId::from_hex(p)
                    .map_err(|e| BraidError::InvalidBytes(format!("parent hash: {e}")))?,
            );
        }
        for t in &self.tokens {
            vertex.tokens.push(
                TokenUid::from_hex(t)
                    .map_err(|e| BraidError::InvalidBytes(format!("token uid: {e}")))?,
            );
        }
        for i in &self.inputs {
            let tx_id = VertexId::from_hex(&i.tx_id)
                .map_err(|e| BraidError::InvalidBytes(format!("input tx id: {e}")))?;
            let data = BASE64
                .decode(&i.data)
                .map_err(|e| BraidError::InvalidBytes(format!("input data: {e}")))?;
            vertex.inputs.push(TxInput::new(tx_id, i.index, data));
        }
        for o in &self.outputs {
            let script = BASE64
                .decode(&o.script)
                .map_err(|e| BraidError::InvalidBytes(format!("output script: {e}")))?;
            vertex.outputs.push(TxOutput::new_with_token(o.value, o.token_data, script));
        }
        vertex.update_hash();

        let computed = vertex.id()?;
        if computed != *expected {
            return Err(BraidError::HashMismatch {
                stored: expected.to_hex(),
                computed: computed.to_hex(),
            });
        }
        Ok(vertex)
    }
}

#[derive(Serialize, Deserialize)]
struct MetadataDoc {
    hash: String,
    spent_outputs: BTreeMap<u8, Vec<String>>,
    children: Vec<String>,
    voided_by: Vec<String>,
    conflict_with: Vec<String>,
    accumulated_weight: f64,
}

fn hex_set(ids: &BTreeSet<VertexId>) -> Vec<String> {
    ids.iter().map(|id| id.to_hex()).collect()
}

fn parse_set(hexes: &[String]) -> Result<BTreeSet<VertexId>, BraidError> {
    hexes
        .iter()
        .map(|h| {
            VertexId::from_hex(h)
                .map_err(|e| BraidError::InvalidBytes(format!("metadata hash: {e}")))
        })
        .collect()
}

impl MetadataDoc {
    fn from_metadata(meta: &VertexMetadata) -> Self {
        Self {
            hash: meta.hash.to_hex(),
            spent_outputs: meta
                .spent_outputs
                .iter()
                .map(|(index, spenders)| (*index, hex_set(spenders)))
                .collect(),
            children: hex_set(&meta.children),
            voided_by: hex_set(&meta.voided_by),
            conflict_with: hex_set(&meta.conflict_with),
            accumulated_weight: meta.accumulated_weight,
        }
    }

    fn into_metadata(self) -> Result<VertexMetadata, BraidError> {
        let hash = VertexId::from_hex(&self.hash)
            .map_err(|e| BraidError::InvalidBytes(format!("metadata hash: {e}")))?;
        let mut meta = VertexMetadata::new(hash);
        for (index, spenders) in &self.spent_outputs {
            meta.spent_outputs.insert(*index, parse_set(spenders)?);
        }
        meta.children = parse_set(&self.children)?;
        meta.voided_by = parse_set(&self.voided_by)?;
        meta.conflict_with = parse_set(&self.conflict_with)?;
        meta.accumulated_weight = self.accumulated_weight;
        Ok(meta)
    }
}
