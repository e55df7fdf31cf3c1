use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking — no migration table needed.
///
/// Deliberately absent from the shares table: the encryption key and any
/// password hash. A read of durable storage alone yields ciphertext only.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: Initial schema

CREATE TABLE shares (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('text', 'file')),
    ciphertext BLOB,
    file_path TEXT,
    file_name TEXT,
    file_mime TEXT,
    file_size INTEGER,
    iv TEXT NOT NULL,
    auth_tag TEXT NOT NULL,
    key_fingerprint TEXT NOT NULL,
    has_password INTEGER NOT NULL DEFAULT 0,
    max_views INTEGER,
    view_count INTEGER NOT NULL DEFAULT 0,
    is_consumed INTEGER NOT NULL DEFAULT 0,
    expires_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_shares_owner ON shares(owner_id);
CREATE INDEX idx_shares_expires ON shares(expires_at);

CREATE TABLE dropbox_requests (
    id TEXT PRIMARY KEY,
    token TEXT NOT NULL UNIQUE,
    owner_id TEXT NOT NULL,
    is_consumed INTEGER NOT NULL DEFAULT 0,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_dropbox_requests_owner ON dropbox_requests(owner_id);
",
    )])
}
