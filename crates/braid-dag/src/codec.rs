//! Canonical fixed-layout binary encoding.
//!
//! Field order and widths are part of consensus: hashes are computed over
//! these bytes, so any change breaks hash-compatibility with existing data.
//! All integers are big-endian.
//!
//! Layout: header `(version:16, weight:f64, timestamp:32, height:64,
//! input_count:16, output_count:16, parent_count:16, token_count:8)`,
//! then parents (32 bytes each), tokens (32 bytes each),
//! inputs `(tx_id:32, output_index:8, data_len:16, data)`,
//! outputs `(value:32, token_data:8, script_len:16, script)`,
//! and a trailing `nonce:32`.

use braid_core::error::BraidError;
use braid_core::types::{TokenUid, VertexId};

use crate::vertex::{TxInput, TxOutput, Vertex, VertexKind};

/// Encoding without the trailing nonce: the input of the first hash round.
pub fn encode_without_nonce(vertex: &Vertex) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(&vertex.version().to_be_bytes());
    buf.extend_from_slice(&vertex.weight.to_be_bytes());
    buf.extend_from_slice(&vertex.timestamp.to_be_bytes());
    buf.extend_from_slice(&vertex.height.to_be_bytes());
    buf.extend_from_slice(&(vertex.inputs.len() as u16).to_be_bytes());
    buf.extend_from_slice(&(vertex.outputs.len() as u16).to_be_bytes());
    buf.extend_from_slice(&(vertex.parents.len() as u16).to_be_bytes());
    buf.push(vertex.tokens.len() as u8);

    for parent in &vertex.parents {
        buf.extend_from_slice(parent.as_bytes());
    }
    for token in &vertex.tokens {
        buf.extend_from_slice(token.as_bytes());
    }
    for input in &vertex.inputs {
        buf.extend_from_slice(input.tx_id.as_bytes());
        buf.push(input.index);
        buf.extend_from_slice(&(input.data.len() as u16).to_be_bytes());
        buf.extend_from_slice(&input.data);
    }
    for output in &vertex.outputs {
        buf.extend_from_slice(&output.value.to_be_bytes());
        buf.push(output.token_data);
        buf.extend_from_slice(&(output.script.len() as u16).to_be_bytes());
        buf.extend_from_slice(&output.script);
    }
    buf
}

/// Complete canonical encoding: nonce-less body plus the 4-byte nonce.
pub fn encode(vertex: &Vertex) -> Vec<u8> {
    let mut buf = encode_without_nonce(vertex);
    buf.extend_from_slice(&vertex.nonce.to_be_bytes());
    buf
}

/// Decode a vertex from its canonical encoding. Consumes fields in the
/// exact wire order and rejects trailing or missing bytes. The hash is
/// recomputed from the decoded fields.
pub fn decode(bytes: &[u8]) -> Result<Vertex, BraidError> {
    let mut reader = Reader::new(bytes);

    let version = reader.read_u16()?;
    let kind = VertexKind::from_version(version)
        .ok_or_else(|| BraidError::InvalidBytes(format!("unknown vertex version {version}")))?;
    let weight = reader.read_f64()?;
    let timestamp = reader.read_u32()?;
    let height = reader.read_u64()?;
    let input_count = reader.read_u16()? as usize;
    let output_count = reader.read_u16()? as usize;
    let parent_count = reader.read_u16()? as usize;
    let token_count = reader.read_u8()? as usize;

    let mut vertex = Vertex::new(kind, timestamp);
    vertex.weight = weight;
    vertex.height = height;

    for _ in 0..parent_count {
        vertex.parents.push(VertexId::from_bytes(reader.read_array()?));
    }
    for _ in 0..token_count {
        vertex.tokens.push(TokenUid::from_bytes(reader.read_array()?));
    }
    for _ in 0..input_count {
        let tx_id = VertexId::from_bytes(reader.read_array()?);
        let index = reader.read_u8()?;
        let data_len = reader.read_u16()? as usize;
        let data = reader.read_bytes(data_len)?.to_vec();
        vertex.inputs.push(TxInput::new(tx_id, index, data));
    }
    for _ in 0..output_count {
        let value = reader.read_u32()?;
        let token_data = reader.read_u8()?;
        let script_len = reader.read_u16()? as usize;
        let script = reader.read_bytes(script_len)?.to_vec();
        vertex.outputs.push(TxOutput::new_with_token(value, token_data, script));
    }
    vertex.nonce = reader.read_u32()?;
    reader.finish()?;

    vertex.update_hash();
    Ok(vertex)
}

/// The sighash form: only the fields spending signatures commit to.
///
/// Emits `(version:16, input_count:16, output_count:16, token_count:8)`,
/// tokens, per-input `(tx_id:32, output_index:8, data_len:16 = 0)` with the
/// unlock data cleared, and full outputs. Parents, weight, timestamp, nonce
/// and height are deliberately excluded so signatures survive remining and
/// stay independent of confirmation metadata.
pub fn sighash_bytes(vertex: &Vertex) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&vertex.version().to_be_bytes());
    buf.extend_from_slice(&(vertex.inputs.len() as u16).to_be_bytes());
    buf.extend_from_slice(&(vertex.outputs.len() as u16).to_be_bytes());
    buf.push(vertex.tokens.len() as u8);

    for token in &vertex.tokens {
        buf.extend_from_slice(token.as_bytes());
    }
    for input in &vertex.inputs {
        buf.extend_from_slice(input.tx_id.as_bytes());
        buf.push(input.index);
        buf.extend_from_slice(&0u16.to_be_bytes());
    }
    for output in &vertex.outputs {
        buf.extend_from_slice(&output.value.to_be_bytes());
        buf.push(output.token_data);
        buf.extend_from_slice(&(output.script.len() as u16).to_be_bytes());
        buf.extend_from_slice(&output.script);
    }
    buf
}

// ── Reader ───────────────────────────────────────────────────────────────────

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], BraidError> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len()).ok_or_else(|| {
            BraidError::InvalidBytes(format!(
                "unexpected end of input: need {n} bytes at offset {}",
                self.pos
            ))
        })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BraidError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.read_bytes(N)?);
        Ok(arr)
    }

    fn read_u8(&mut self) -> Result<u8, BraidError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, BraidError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, BraidError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, BraidError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    fn read_f64(&mut self) -> Result<f64, BraidError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    fn finish(self) -> Result<(), BraidError> {
        if self.pos != self.buf.len() {
            return Err(BraidError::InvalidBytes(format!(
                "{} trailing bytes after vertex",
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Vertex {
        let mut tx = Vertex::new(VertexKind::Transaction, 1_539_271_482);
        tx.weight = 17.25;
        tx.height = 3;
        tx.nonce = 0xdead_beef;
        tx.parents = vec![VertexId::from_bytes([1; 32]), VertexId::from_bytes([2; 32])];
        tx.tokens = vec![TokenUid::from_bytes([9; 32])];
        tx.inputs = vec![TxInput::new(VertexId::from_bytes([3; 32]), 1, vec![0xaa, 0xbb])];
        tx.outputs = vec![
            TxOutput::new(5000, vec![0x76, 0xa9]),
            TxOutput::new_with_token(1, 0x81, vec![]),
        ];
        tx.update_hash();
        tx
    }

    fn sample_block() -> Vertex {
        let mut block = Vertex::new(VertexKind::Block, 1_539_271_481);
        block.weight = 21.0;
        block.height = 7;
        block.parents = vec![
            VertexId::from_bytes([4; 32]),
            VertexId::from_bytes([1; 32]),
            VertexId::from_bytes([2; 32]),
        ];
        block.outputs = vec![TxOutput::new(2000, vec![0x51])];
        block.update_hash();
        block
    }

    #[test]
    fn round_trip_transaction() {
        let tx = sample_tx();
        let decoded = decode(&encode(&tx)).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
    }

    #[test]
    fn round_trip_block() {
        let block = sample_block();
        let decoded = decode(&encode(&block)).unwrap();
        assert_eq!(decoded, block);
        assert!(decoded.is_block());
    }

    #[test]
    fn nonce_is_the_trailing_field() {
        let tx = sample_tx();
        let bytes = encode(&tx);
        let body = encode_without_nonce(&tx);
        assert_eq!(&bytes[..body.len()], &body[..]);
        assert_eq!(&bytes[body.len()..], &tx.nonce.to_be_bytes());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode(&sample_tx());
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(BraidError::InvalidBytes(_))));
    }

    #[test]
    fn truncated_bytes_rejected() {
        let bytes = encode(&sample_tx());
        assert!(matches!(decode(&bytes[..bytes.len() - 1]), Err(BraidError::InvalidBytes(_))));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut bytes = encode(&sample_tx());
        bytes[0] = 0xff;
        assert!(matches!(decode(&bytes), Err(BraidError::InvalidBytes(_))));
    }

    #[test]
    fn sighash_ignores_mining_fields() {
        let tx = sample_tx();
        let mut remined = tx.clone();
        remined.nonce = 1;
        remined.timestamp += 100;
        remined.weight = 30.0;
        remined.height = 99;
        remined.parents = vec![VertexId::from_bytes([8; 32]), VertexId::from_bytes([7; 32])];
        remined.update_hash();
        assert_ne!(remined.hash(), tx.hash());
        assert_eq!(remined.sighash_bytes(), tx.sighash_bytes());
    }

    #[test]
    fn sighash_clears_input_data() {
        let tx = sample_tx();
        let mut unlocked = tx.clone();
        unlocked.inputs[0].data = vec![0xff; 70];
        assert_eq!(unlocked.sighash_bytes(), tx.sighash_bytes());
    }

    #[test]
    fn sighash_commits_to_outputs() {
        let tx = sample_tx();
        let mut altered = tx.clone();
        altered.outputs[0].value += 1;
        assert_ne!(altered.sighash_bytes(), tx.sighash_bytes());
    }
}
