//! AES-256-GCM encryption with detached iv and auth tag.
//!
//! Wire format: ciphertext stored as-is (inline BLOB or blob file), iv
//! (12 bytes) and GCM tag (16 bytes) carried separately, base64url-encoded,
//! so a record is self-describing without embedding framing in the payload.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

use crate::error::StoreError;

const TAG_LEN: usize = 16;

/// Output of a single encryption call.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    /// base64url-encoded 12-byte nonce
    pub iv: String,
    /// base64url-encoded 16-byte GCM tag
    pub auth_tag: String,
}

/// Generate a fresh 256-bit content key.
pub fn generate_key() -> [u8; 32] {
    rand::rng().random()
}

/// Canonical key encoding used in share links and for fingerprinting.
pub fn encode_key(key: &[u8; 32]) -> String {
    URL_SAFE_NO_PAD.encode(key)
}

/// Decode a caller-supplied key. Anything that is not exactly 32 bytes of
/// base64url is an invalid key, not a decryption failure.
pub fn decode_key(encoded: &str) -> Result<[u8; 32], StoreError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| StoreError::InvalidKey)?;
    bytes.try_into().map_err(|_| StoreError::InvalidKey)
}

/// Encrypt plaintext under a content key with a fresh random nonce.
pub fn encrypt(plaintext: &[u8], key: &[u8; 32]) -> Sealed {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce_bytes: [u8; 12] = rand::rng().random();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut ciphertext = cipher
        .encrypt(nonce, plaintext)
        .expect("AES-256-GCM encryption should not fail");
    let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);

    Sealed {
        ciphertext,
        iv: URL_SAFE_NO_PAD.encode(nonce_bytes),
        auth_tag: URL_SAFE_NO_PAD.encode(tag),
    }
}

/// Decrypt and verify. Fails if the tag does not verify: tampered
/// ciphertext, wrong key, or mismatched iv/tag pairing.
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8; 32],
    iv: &str,
    auth_tag: &str,
) -> Result<Vec<u8>, StoreError> {
    let nonce_bytes = URL_SAFE_NO_PAD
        .decode(iv)
        .map_err(|_| StoreError::DecryptionFailed)?;
    if nonce_bytes.len() != 12 {
        return Err(StoreError::DecryptionFailed);
    }
    let tag = URL_SAFE_NO_PAD
        .decode(auth_tag)
        .map_err(|_| StoreError::DecryptionFailed)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut combined = Vec::with_capacity(ciphertext.len() + tag.len());
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(&tag);

    cipher
        .decrypt(nonce, combined.as_slice())
        .map_err(|_| StoreError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_encrypt_decrypt() {
        let key = generate_key();
        let sealed = encrypt(b"hello sealed world", &key);

        let plaintext = decrypt(&sealed.ciphertext, &key, &sealed.iv, &sealed.auth_tag).unwrap();
        assert_eq!(plaintext, b"hello sealed world");
    }

    #[test]
    fn test_wrong_key_fails_decrypt() {
        let key = generate_key();
        let other = generate_key();
        let sealed = encrypt(b"sensitive", &key);

        let result = decrypt(&sealed.ciphertext, &other, &sealed.iv, &sealed.auth_tag);
        assert!(matches!(result, Err(StoreError::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_ciphertext_fails_decrypt() {
        let key = generate_key();
        let mut sealed = encrypt(b"integrity matters", &key);
        sealed.ciphertext[0] ^= 0xff;

        let result = decrypt(&sealed.ciphertext, &key, &sealed.iv, &sealed.auth_tag);
        assert!(matches!(result, Err(StoreError::DecryptionFailed)));
    }

    #[test]
    fn test_nonces_are_fresh_per_call() {
        let key = generate_key();
        let a = encrypt(b"same plaintext", &key);
        let b = encrypt(b"same plaintext", &key);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_key_codec_roundtrip() {
        let key = generate_key();
        let encoded = encode_key(&key);
        assert_eq!(decode_key(&encoded).unwrap(), key);
    }

    #[test]
    fn test_decode_key_rejects_bad_input() {
        assert!(matches!(decode_key("not base64url!!"), Err(StoreError::InvalidKey)));
        // Valid base64url but wrong length
        assert!(matches!(decode_key("c2hvcnQ"), Err(StoreError::InvalidKey)));
    }
}
