//! Error types for store operations.
//!
//! Policy rejections (wrong key, missing password, lost consumption race)
//! are expected outcomes a caller can recover from; their messages never
//! carry secret material or internal identifiers. Decryption and storage
//! faults are logged with full context at the call site and surfaced
//! generically.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Id/token absent, expired, or already swept. Deliberately
    /// indistinguishable cases: callers cannot probe whether an id ever
    /// existed.
    #[error("not found or expired")]
    NotFoundOrExpired,

    /// Key fingerprint mismatch.
    #[error("invalid key")]
    InvalidKey,

    /// Protected share and no (or incomplete) credentials supplied.
    #[error("password required")]
    PasswordRequired,

    /// Credentials supplied but the token signature or password is wrong.
    #[error("invalid password")]
    InvalidPassword,

    /// Lost a consumption race or the view limit was already reached.
    #[error("already consumed")]
    AlreadyConsumed,

    /// AEAD tag verification failed despite a matching fingerprint.
    /// Treated as data corruption, not a policy rejection.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Backing blob missing or unreadable when metadata says it exists.
    #[error("storage fault: {0}")]
    StorageFault(String),

    /// Password hashing failure at share creation.
    #[error("password hashing error: {0}")]
    PasswordHash(String),

    /// Token signing failure at share creation.
    #[error("token error: {source}")]
    Token {
        #[from]
        source: jsonwebtoken::errors::Error,
    },

    #[error("database error: {source}")]
    Database {
        #[from]
        source: rusqlite::Error,
    },

    #[error("database lock error")]
    DbLock,
}
