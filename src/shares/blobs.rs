//! Encrypted blob file I/O for file-backed shares.
//!
//! Blobs live at `{uploads_dir}/{YYYY-MM}/{id}.enc` — the path is derived
//! from the share id and its creation month, which bounds directory sizes
//! without any extra bookkeeping. The database stores the relative path;
//! the record referencing a blob is only inserted after the write completes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Relative blob path for a share created at the given instant.
pub fn relative_blob_path(id: &str, created_at: DateTime<Utc>) -> String {
    format!("{}/{}.enc", created_at.format("%Y-%m"), id)
}

fn blob_file_path(uploads_dir: &str, relative: &str) -> PathBuf {
    Path::new(uploads_dir).join(relative)
}

/// Write an encrypted blob, creating the month directory if needed.
pub fn write_blob(uploads_dir: &str, relative: &str, data: &[u8]) -> std::io::Result<()> {
    let path = blob_file_path(uploads_dir, relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, data)
}

/// Read an encrypted blob back.
pub fn read_blob(uploads_dir: &str, relative: &str) -> std::io::Result<Vec<u8>> {
    std::fs::read(blob_file_path(uploads_dir, relative))
}

/// Remove a blob, best-effort. A missing file is fine (already cleaned);
/// anything else is logged and left for the next sweep pass.
pub fn remove_blob(uploads_dir: &str, relative: &str) {
    let path = blob_file_path(uploads_dir, relative);
    if let Err(e) = std::fs::remove_file(&path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove blob {}: {}", path.display(), e);
        }
    }
}

/// Whether a blob currently exists on disk.
pub fn blob_exists(uploads_dir: &str, relative: &str) -> bool {
    blob_file_path(uploads_dir, relative).exists()
}
