//! Key-possession fingerprinting.
//!
//! The stored fingerprint lets the store reject an obviously-wrong key
//! before doing any AEAD work, without keeping a value that could recover
//! the key. SHA-256 over the canonical base64url encoding, truncated to
//! 128 bits: truncation narrows the verification collision space, not the
//! 256-bit search space of the key itself. The AEAD tag remains the
//! cryptographic backstop on every decrypt.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::crypto::envelope;

/// One-way digest of a content key, truncated to 16 bytes and
/// base64url-encoded. This is the only key-derived value ever persisted.
pub fn key_fingerprint(key: &[u8; 32]) -> String {
    let encoded = envelope::encode_key(key);
    let digest = Sha256::digest(encoded.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let key = envelope::generate_key();
        assert_eq!(key_fingerprint(&key), key_fingerprint(&key));
    }

    #[test]
    fn test_different_keys_produce_different_fingerprints() {
        let a = envelope::generate_key();
        let b = envelope::generate_key();
        assert_ne!(key_fingerprint(&a), key_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_is_truncated() {
        let key = envelope::generate_key();
        let fp = key_fingerprint(&key);
        // 16 bytes of digest -> 22 chars of unpadded base64url
        assert_eq!(fp.len(), 22);
    }

    #[test]
    fn test_fingerprint_differs_from_key_encoding() {
        let key = envelope::generate_key();
        assert_ne!(key_fingerprint(&key), envelope::encode_key(&key));
    }
}
