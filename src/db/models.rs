//! Database row types for all tables.
//! These correspond 1:1 to the SQLite schema defined in migrations.rs.

use serde::{Deserialize, Serialize};

/// Share payload location: inline ciphertext or an encrypted blob file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    Text,
    File,
}

impl ShareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareKind::Text => "text",
            ShareKind::File => "file",
        }
    }

    pub fn parse(s: &str) -> Option<ShareKind> {
        match s {
            "text" => Some(ShareKind::Text),
            "file" => Some(ShareKind::File),
            _ => None,
        }
    }
}

/// Share record in the shares table.
#[derive(Debug, Clone)]
pub struct ShareRow {
    pub id: String,
    pub owner_id: String,
    pub kind: ShareKind,
    /// Inline ciphertext (text shares only)
    pub ciphertext: Option<Vec<u8>>,
    /// Blob path relative to the uploads dir (file shares only)
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_mime: Option<String>,
    pub file_size: Option<i64>,
    pub iv: String,
    pub auth_tag: String,
    /// Truncated digest of the content key — never the key itself
    pub key_fingerprint: String,
    pub has_password: bool,
    pub max_views: Option<i64>,
    pub view_count: i64,
    pub is_consumed: bool,
    pub expires_at: Option<String>,
    pub created_at: String,
}

/// Drop-box request record in the dropbox_requests table.
#[derive(Debug, Clone)]
pub struct DropboxRequestRow {
    pub id: String,
    pub token: String,
    pub owner_id: String,
    pub is_consumed: bool,
    pub expires_at: String,
    pub created_at: String,
}

/// Non-sensitive share fields, servable before any key is supplied.
/// Drives the pre-key landing view; never touches ciphertext.
#[derive(Debug, Clone, Serialize)]
pub struct ShareMetadata {
    pub id: String,
    pub kind: ShareKind,
    pub has_password: bool,
    pub max_views: Option<i64>,
    pub view_count: i64,
    pub is_consumed: bool,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub file_name: Option<String>,
    pub file_mime: Option<String>,
    pub file_size: Option<i64>,
}
