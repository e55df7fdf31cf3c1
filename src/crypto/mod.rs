//! Cryptographic envelope: AEAD encryption, key-possession fingerprinting,
//! and HMAC-signed opaque tokens.
//!
//! The durable record keeps ciphertext, iv, auth tag, and a truncated key
//! fingerprint. The key itself and anything password-derived exist only in
//! the creation response and in caller-supplied values at view time.

pub mod envelope;
pub mod fingerprint;
pub mod secret;
pub mod token;
