use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC). The wire format stores 4 bytes.
pub type Timestamp = u32;

/// Block height in the block-subgraph. Carried by transactions too, but
/// only authoritative for blocks.
pub type Height = u64;

/// Log2-encoded work score. Assigned before mining, never stored work itself.
pub type Weight = f64;

// ── VertexId ─────────────────────────────────────────────────────────────────

/// 32-byte vertex identifier: double SHA-256 of the canonical encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub [u8; 32]);

impl VertexId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lower-case hex, the representation used at every human-facing
    /// boundary (JSON fields, filenames, logs).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({}…)", &self.to_hex()[..16])
    }
}

// ── TokenUid ─────────────────────────────────────────────────────────────────

/// 32-byte token identifier. The all-zero id is the network's native token;
/// it is implicit at token index 0 and never listed in a vertex's `tokens`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenUid(pub [u8; 32]);

impl TokenUid {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The implicit native token (all zeroes).
    pub fn native() -> Self {
        Self([0u8; 32])
    }

    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for TokenUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TokenUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenUid({}…)", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_id_hex_round_trip() {
        let id = VertexId::from_bytes([0xab; 32]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(VertexId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn vertex_id_rejects_short_hex() {
        assert!(VertexId::from_hex("abcd").is_err());
    }

    #[test]
    fn native_token_is_all_zero() {
        assert!(TokenUid::native().is_native());
        assert!(!TokenUid::from_bytes([1; 32]).is_native());
    }
}
