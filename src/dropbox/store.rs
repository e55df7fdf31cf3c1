//! Drop-box request persistence and fulfillment.
//!
//! A request is addressed by an unguessable public token, kept separate
//! from its internal id so the id namespace is not enumerable. Fulfillment
//! consumes the token, mints a share protected by a system-generated
//! password, and notifies the owner out of band.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::OptionalExtension;

use crate::db::models::DropboxRequestRow;
use crate::db::DbPool;
use crate::error::{Result, StoreError};
use crate::ids;
use crate::notify::Notifier;
use crate::shares::store::{self, CreateFileShare, CreateTextShare};

/// Creation result for a drop-box request.
#[derive(Debug, Clone)]
pub struct CreatedRequest {
    pub id: String,
    pub token: String,
    /// Public upload URL handed to the outside party
    pub url: String,
}

/// Inbound payload deposited through a drop-box link.
#[derive(Debug, Clone)]
pub enum UploadPayload {
    Text {
        text: String,
    },
    File {
        data: Vec<u8>,
        file_name: String,
        file_mime: String,
    },
}

/// Create a single-use upload request with an absolute expiry.
pub fn create_request(
    db: &DbPool,
    owner_id: &str,
    ttl_hours: i64,
    base_url: &str,
) -> Result<CreatedRequest> {
    let id = ids::random_id(ids::SHARE_ID_LEN);
    let token = ids::random_id(ids::DROPBOX_TOKEN_LEN);
    let now = Utc::now();
    let expires_at = now + Duration::hours(ttl_hours);

    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    conn.execute(
        "INSERT INTO dropbox_requests (id, token, owner_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            id,
            token,
            owner_id,
            expires_at.to_rfc3339(),
            now.to_rfc3339()
        ],
    )?;

    let url = format!("{}/upload/{}", base_url.trim_end_matches('/'), token);
    Ok(CreatedRequest { id, token, url })
}

fn row_to_request(row: &rusqlite::Row) -> rusqlite::Result<DropboxRequestRow> {
    Ok(DropboxRequestRow {
        id: row.get(0)?,
        token: row.get(1)?,
        owner_id: row.get(2)?,
        is_consumed: row.get(3)?,
        expires_at: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Look up a request by public token. Servable iff not consumed and not
/// expired; anything else is indistinguishable from never having existed.
pub fn get_request(db: &DbPool, token: &str) -> Result<DropboxRequestRow> {
    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    conn.query_row(
        "SELECT id, token, owner_id, is_consumed, expires_at, created_at
         FROM dropbox_requests
         WHERE token = ?1 AND is_consumed = 0 AND expires_at > ?2",
        rusqlite::params![token, Utc::now().to_rfc3339()],
        row_to_request,
    )
    .optional()?
    .ok_or(StoreError::NotFoundOrExpired)
}

/// Atomically consume a servable request. Of N concurrent fulfillments of
/// the same token, exactly one update matches; the rest see
/// `NotFoundOrExpired`.
fn consume_request(db: &DbPool, token: &str) -> Result<DropboxRequestRow> {
    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    conn.query_row(
        "UPDATE dropbox_requests SET is_consumed = 1
         WHERE token = ?1 AND is_consumed = 0 AND expires_at > ?2
         RETURNING id, token, owner_id, is_consumed, expires_at, created_at",
        rusqlite::params![token, Utc::now().to_rfc3339()],
        row_to_request,
    )
    .optional()?
    .ok_or(StoreError::NotFoundOrExpired)
}

// The uploader never chooses or sees this password; it exists to reuse the
// share password machinery for at-rest protection of inbound data.
fn generate_password() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Fulfill a request: consume the token, create a password-protected share
/// owned by the requester, and notify them with the view link and the
/// generated password. Notification is best-effort — the data is already
/// safely stored, so delivery failure is logged, not propagated.
pub fn fulfill(
    db: &DbPool,
    uploads_dir: &str,
    token: &str,
    payload: UploadPayload,
    secret: &[u8],
    base_url: &str,
    notifier: &dyn Notifier,
) -> Result<()> {
    let request = consume_request(db, token)?;
    let password = generate_password();

    let created = match payload {
        UploadPayload::Text { text } => store::create_text_share(
            db,
            CreateTextShare {
                owner_id: request.owner_id.clone(),
                text,
                password: Some(password.clone()),
                max_views: None,
                expires_at: None,
            },
            secret,
        )?,
        UploadPayload::File {
            data,
            file_name,
            file_mime,
        } => store::create_file_share(
            db,
            uploads_dir,
            CreateFileShare {
                owner_id: request.owner_id.clone(),
                data,
                file_name,
                file_mime,
                password: Some(password.clone()),
                max_views: None,
                expires_at: None,
            },
            secret,
        )?,
    };

    let url = store::view_url(base_url, &created);
    if let Err(e) = notifier.upload_received(&request.owner_id, &url, &password) {
        tracing::warn!(
            "Upload notification for request {} failed: {}",
            request.id,
            e
        );
    }

    Ok(())
}

/// Delete every consumed or expired request. Returns the number removed.
pub fn sweep_expired(db: &DbPool) -> Result<usize> {
    let conn = db.lock().map_err(|_| StoreError::DbLock)?;
    let count = conn.execute(
        "DELETE FROM dropbox_requests WHERE is_consumed = 1 OR expires_at <= ?1",
        [&Utc::now().to_rfc3339()],
    )?;
    Ok(count)
}
