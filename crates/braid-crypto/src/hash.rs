use braid_core::types::VertexId;
use sha2::{Digest, Sha256};

/// Start the double-SHA-256 of a vertex: the first round covers the
/// encoding *without* the nonce. The returned state is reusable — the
/// mining loop clones it once per nonce instead of re-hashing the body.
pub fn partial_hash(struct_without_nonce: &[u8]) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update(struct_without_nonce);
    hasher
}

/// Finish a partial digest: append the big-endian nonce, close the first
/// round, and apply the second SHA-256 round over its digest.
pub fn finish_hash(partial: Sha256, nonce: u32) -> VertexId {
    let mut first = partial;
    first.update(nonce.to_be_bytes());
    let digest = Sha256::digest(first.finalize());
    VertexId::from_bytes(digest.into())
}

/// Full vertex hash: `sha256(sha256(encode_without_nonce || nonce))`.
pub fn vertex_hash(struct_without_nonce: &[u8], nonce: u32) -> VertexId {
    finish_hash(partial_hash(struct_without_nonce), nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_plus_finish_equals_full() {
        let body = b"vertex body bytes";
        let partial = partial_hash(body);
        assert_eq!(finish_hash(partial, 1234), vertex_hash(body, 1234));
    }

    #[test]
    fn nonce_changes_hash() {
        let body = b"vertex body bytes";
        assert_ne!(vertex_hash(body, 0), vertex_hash(body, 1));
    }

    #[test]
    fn known_double_sha256() {
        // sha256(sha256(b"" || 0u32_be))
        let hash = vertex_hash(b"", 0);
        let expected = {
            use sha2::Digest;
            let first = Sha256::digest(0u32.to_be_bytes());
            Sha256::digest(first)
        };
        assert_eq!(hash.as_bytes(), &<[u8; 32]>::from(expected));
    }
}
