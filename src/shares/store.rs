//! Share persistence and the guarded read path.
//!
//! Functions here are synchronous and take the shared connection plus the
//! uploads directory; async callers wrap them in `spawn_blocking`. The
//! durable record holds ciphertext, iv, auth tag, and the key fingerprint —
//! never the key, never anything password-derived.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use crate::crypto::{envelope, fingerprint, token};
use crate::db::models::{ShareKind, ShareMetadata, ShareRow};
use crate::db::DbPool;
use crate::error::{Result, StoreError};
use crate::ids;
use crate::shares::blobs;

/// Options for creating a text share.
#[derive(Debug, Clone)]
pub struct CreateTextShare {
    pub owner_id: String,
    pub text: String,
    pub password: Option<String>,
    pub max_views: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Options for creating a file share.
#[derive(Debug, Clone)]
pub struct CreateFileShare {
    pub owner_id: String,
    pub data: Vec<u8>,
    pub file_name: String,
    pub file_mime: String,
    pub password: Option<String>,
    pub max_views: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Creation result. The key and password token exist only in this value;
/// the caller must retain them — the server keeps no copy.
#[derive(Debug, Clone)]
pub struct CreatedShare {
    pub id: String,
    /// base64url-encoded 256-bit content key
    pub key: String,
    /// Signed password token, present iff a password was set
    pub password_token: Option<String>,
}

/// Decrypted content returned from a successful view.
#[derive(Debug)]
pub enum ShareContent {
    Text(String),
    File {
        data: Vec<u8>,
        name: String,
        mime: String,
        size: i64,
    },
}

/// Share link with secrets confined to the URL fragment, so they never
/// appear in request paths or access logs. The key encoding is dot-free,
/// so the first `.` separates key from password token.
pub fn view_url(base_url: &str, created: &CreatedShare) -> String {
    let base = base_url.trim_end_matches('/');
    match &created.password_token {
        Some(t) => format!("{}/view/{}#{}.{}", base, created.id, created.key, t),
        None => format!("{}/view/{}#{}", base, created.id, created.key),
    }
}

/// Encrypt and persist a text share. Returns the id, the key, and — if a
/// password was supplied — the signed password token minted from it.
pub fn create_text_share(
    db: &DbPool,
    opts: CreateTextShare,
    secret: &[u8],
) -> Result<CreatedShare> {
    let id = ids::random_id(ids::SHARE_ID_LEN);
    let key = envelope::generate_key();
    let sealed = envelope::encrypt(opts.text.as_bytes(), &key);
    let fp = fingerprint::key_fingerprint(&key);

    let password_token = match &opts.password {
        Some(p) => Some(token::issue_password_token(p, secret)?),
        None => None,
    };

    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    conn.execute(
        "INSERT INTO shares (id, owner_id, kind, ciphertext, iv, auth_tag, key_fingerprint, has_password, max_views, expires_at, created_at)
         VALUES (?1, ?2, 'text', ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            id,
            opts.owner_id,
            sealed.ciphertext,
            sealed.iv,
            sealed.auth_tag,
            fp,
            opts.password.is_some(),
            opts.max_views,
            opts.expires_at.map(|t| t.to_rfc3339()),
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(CreatedShare {
        id,
        key: envelope::encode_key(&key),
        password_token,
    })
}

/// Encrypt and persist a file share. The encrypted blob is written before
/// the row referencing it, so a registered path always has a backing file.
pub fn create_file_share(
    db: &DbPool,
    uploads_dir: &str,
    opts: CreateFileShare,
    secret: &[u8],
) -> Result<CreatedShare> {
    let id = ids::random_id(ids::SHARE_ID_LEN);
    let key = envelope::generate_key();
    let sealed = envelope::encrypt(&opts.data, &key);
    let fp = fingerprint::key_fingerprint(&key);

    let password_token = match &opts.password {
        Some(p) => Some(token::issue_password_token(p, secret)?),
        None => None,
    };

    let created_at = Utc::now();
    let rel_path = blobs::relative_blob_path(&id, created_at);
    blobs::write_blob(uploads_dir, &rel_path, &sealed.ciphertext)
        .map_err(|e| StoreError::StorageFault(format!("write blob {}: {}", rel_path, e)))?;

    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    conn.execute(
        "INSERT INTO shares (id, owner_id, kind, file_path, file_name, file_mime, file_size, iv, auth_tag, key_fingerprint, has_password, max_views, expires_at, created_at)
         VALUES (?1, ?2, 'file', ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        rusqlite::params![
            id,
            opts.owner_id,
            rel_path,
            opts.file_name,
            opts.file_mime,
            opts.data.len() as i64,
            sealed.iv,
            sealed.auth_tag,
            fp,
            opts.password.is_some(),
            opts.max_views,
            opts.expires_at.map(|t| t.to_rfc3339()),
            created_at.to_rfc3339(),
        ],
    )?;

    Ok(CreatedShare {
        id,
        key: envelope::encode_key(&key),
        password_token,
    })
}

fn row_to_share(row: &rusqlite::Row) -> rusqlite::Result<ShareRow> {
    let kind_str: String = row.get(2)?;
    let kind = ShareKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown share kind: {}", kind_str).into(),
        )
    })?;

    Ok(ShareRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        kind,
        ciphertext: row.get(3)?,
        file_path: row.get(4)?,
        file_name: row.get(5)?,
        file_mime: row.get(6)?,
        file_size: row.get(7)?,
        iv: row.get(8)?,
        auth_tag: row.get(9)?,
        key_fingerprint: row.get(10)?,
        has_password: row.get(11)?,
        max_views: row.get(12)?,
        view_count: row.get(13)?,
        is_consumed: row.get(14)?,
        expires_at: row.get(15)?,
        created_at: row.get(16)?,
    })
}

const SHARE_COLUMNS: &str = "id, owner_id, kind, ciphertext, file_path, file_name, file_mime, file_size, iv, auth_tag, key_fingerprint, has_password, max_views, view_count, is_consumed, expires_at, created_at";

/// Fetch non-sensitive fields for the pre-key landing view. Never counts
/// as a view and never touches ciphertext.
pub fn get_metadata(db: &DbPool, id: &str) -> Result<ShareMetadata> {
    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    let share = conn
        .query_row(
            &format!("SELECT {} FROM shares WHERE id = ?1", SHARE_COLUMNS),
            [id],
            row_to_share,
        )
        .optional()?
        .ok_or(StoreError::NotFoundOrExpired)?;

    Ok(ShareMetadata {
        id: share.id,
        kind: share.kind,
        has_password: share.has_password,
        max_views: share.max_views,
        view_count: share.view_count,
        is_consumed: share.is_consumed,
        expires_at: share.expires_at,
        created_at: share.created_at,
        file_name: share.file_name,
        file_mime: share.file_mime,
        file_size: share.file_size,
    })
}

/// The guarded read path. Checks short-circuit in a fixed order, each
/// failure terminal:
///
/// 1. fetch a snapshot of the row, gated on expiry — absent or expired is
///    indistinguishable to the caller
/// 2. key fingerprint comparison, before any decryption work
/// 3. password token signature, then password, for protected shares
/// 4. atomic view accounting — exactly one winner per remaining view
/// 5. AEAD decryption from the snapshot
/// 6. a consuming view releases the backing blob
pub fn view_share(
    db: &DbPool,
    uploads_dir: &str,
    id: &str,
    key: &str,
    password: Option<&str>,
    password_token: Option<&str>,
    secret: &[u8],
) -> Result<ShareContent> {
    let share = {
        let conn = db.lock().map_err(|_| StoreError::DbLock)?;
        conn.query_row(
            &format!(
                "SELECT {} FROM shares WHERE id = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                SHARE_COLUMNS
            ),
            rusqlite::params![id, Utc::now().to_rfc3339()],
            row_to_share,
        )
        .optional()?
        .ok_or(StoreError::NotFoundOrExpired)?
    };

    let key = envelope::decode_key(key)?;
    if fingerprint::key_fingerprint(&key) != share.key_fingerprint {
        return Err(StoreError::InvalidKey);
    }

    if share.has_password {
        let (Some(password), Some(ptoken)) = (password, password_token) else {
            return Err(StoreError::PasswordRequired);
        };
        if !token::verify_password_token(ptoken, password, secret) {
            return Err(StoreError::InvalidPassword);
        }
    }

    let consumed_now = record_view(db, &share)?;

    let content = match decrypt_content(uploads_dir, &share, &key) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Share {} content fault: {}", share.id, e);
            return Err(e);
        }
    };

    if consumed_now {
        if let Some(rel) = &share.file_path {
            blobs::remove_blob(uploads_dir, rel);
        }
    }

    Ok(content)
}

/// Count one view. When a view limit is set this is a compare-and-swap
/// gated on the consumption flag: of N viewers racing on the last
/// remaining view, exactly one update matches and the rest observe
/// `AlreadyConsumed`. Returns whether this view consumed the share.
fn record_view(db: &DbPool, share: &ShareRow) -> Result<bool> {
    let conn = db.lock().map_err(|_| StoreError::DbLock)?;

    if share.max_views.is_some() {
        let consumed: Option<bool> = conn
            .query_row(
                "UPDATE shares
                 SET view_count = view_count + 1,
                     is_consumed = CASE WHEN view_count + 1 >= max_views THEN 1 ELSE 0 END
                 WHERE id = ?1 AND is_consumed = 0
                 RETURNING is_consumed",
                [&share.id],
                |row| row.get(0),
            )
            .optional()?;
        consumed.ok_or(StoreError::AlreadyConsumed)
    } else {
        conn.execute(
            "UPDATE shares SET view_count = view_count + 1 WHERE id = ?1",
            [&share.id],
        )?;
        Ok(false)
    }
}

fn decrypt_content(uploads_dir: &str, share: &ShareRow, key: &[u8; 32]) -> Result<ShareContent> {
    match share.kind {
        ShareKind::Text => {
            let ciphertext = share
                .ciphertext
                .as_deref()
                .ok_or_else(|| StoreError::StorageFault("text share has no ciphertext".into()))?;
            let plaintext = envelope::decrypt(ciphertext, key, &share.iv, &share.auth_tag)?;
            let text =
                String::from_utf8(plaintext).map_err(|_| StoreError::DecryptionFailed)?;
            Ok(ShareContent::Text(text))
        }
        ShareKind::File => {
            let rel = share
                .file_path
                .as_deref()
                .ok_or_else(|| StoreError::StorageFault("file share has no blob path".into()))?;
            let encrypted = blobs::read_blob(uploads_dir, rel)
                .map_err(|e| StoreError::StorageFault(format!("read blob {}: {}", rel, e)))?;
            let data = envelope::decrypt(&encrypted, key, &share.iv, &share.auth_tag)?;
            let size = share.file_size.unwrap_or(data.len() as i64);
            Ok(ShareContent::File {
                data,
                name: share.file_name.clone().unwrap_or_default(),
                mime: share.file_mime.clone().unwrap_or_default(),
                size,
            })
        }
    }
}

/// Delete a share. Requires the same proof of key possession as viewing:
/// a wrong key or missing row returns `false` with no mutation.
pub fn delete_share(db: &DbPool, uploads_dir: &str, id: &str, key: &str) -> Result<bool> {
    let Ok(key) = envelope::decode_key(key) else {
        return Ok(false);
    };

    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    let row: Option<(String, Option<String>)> = conn
        .query_row(
            "SELECT key_fingerprint, file_path FROM shares WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((fp, file_path)) = row else {
        return Ok(false);
    };
    if fingerprint::key_fingerprint(&key) != fp {
        return Ok(false);
    }

    if let Some(rel) = file_path {
        blobs::remove_blob(uploads_dir, &rel);
    }
    conn.execute("DELETE FROM shares WHERE id = ?1", [id])?;
    Ok(true)
}

/// Delete every share violating the servability invariant — consumed, or
/// past its expiry — along with backing blobs. Returns the number removed.
pub fn sweep_expired(db: &DbPool, uploads_dir: &str) -> Result<usize> {
    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    let now = Utc::now().to_rfc3339();

    let mut stmt = conn.prepare(
        "SELECT file_path FROM shares
         WHERE is_consumed = 1 OR (expires_at IS NOT NULL AND expires_at <= ?1)",
    )?;
    let paths: Vec<Option<String>> = stmt
        .query_map([&now], |row| row.get(0))?
        .filter_map(|r| r.ok())
        .collect();
    drop(stmt);

    for rel in paths.iter().flatten() {
        blobs::remove_blob(uploads_dir, rel);
    }

    let count = conn.execute(
        "DELETE FROM shares
         WHERE is_consumed = 1 OR (expires_at IS NOT NULL AND expires_at <= ?1)",
        [&now],
    )?;
    Ok(count)
}
