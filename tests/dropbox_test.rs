//! Integration tests for the drop-box protocol: request lifecycle,
//! single-use fulfillment, owner notification, and sweeps.

use std::sync::Mutex;

use chrono::{Duration, Utc};

use sealdrop_server::db::{self, DbPool};
use sealdrop_server::dropbox::store::{
    create_request, fulfill, get_request, sweep_expired, UploadPayload,
};
use sealdrop_server::error::StoreError;
use sealdrop_server::notify::Notifier;
use sealdrop_server::shares::store::{get_metadata, view_share, ShareContent};

const SECRET: &[u8] = b"integration-test-signing-secret!";
const BASE_URL: &str = "https://drop.example.com";

struct TestEnv {
    db: DbPool,
    uploads_dir: String,
    _tmp: tempfile::TempDir,
}

fn setup() -> TestEnv {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let data_dir = tmp.path().to_str().unwrap().to_string();
    let db = db::init_db(&data_dir).expect("init db");
    TestEnv {
        db,
        uploads_dir: format!("{}/uploads", data_dir),
        _tmp: tmp,
    }
}

/// Captures notifications instead of sending mail.
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(String, String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn upload_received(
        &self,
        owner_id: &str,
        view_url: &str,
        password: &str,
    ) -> Result<(), String> {
        self.messages.lock().unwrap().push((
            owner_id.to_string(),
            view_url.to_string(),
            password.to_string(),
        ));
        Ok(())
    }
}

/// Always fails, to prove delivery problems never fail the upload.
struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn upload_received(&self, _: &str, _: &str, _: &str) -> Result<(), String> {
        Err("smtp down".to_string())
    }
}

/// Split a notified view URL back into (share id, key, password token).
fn parse_view_url(url: &str) -> (String, String, String) {
    let (path, fragment) = url.split_once('#').expect("fragment");
    let id = path.rsplit('/').next().unwrap().to_string();
    let (key, token) = fragment.split_once('.').expect("key.token fragment");
    (id, key.to_string(), token.to_string())
}

#[test]
fn test_create_and_get_request() {
    let env = setup();
    let created = create_request(&env.db, "bob", 48, BASE_URL).unwrap();

    assert_eq!(created.url, format!("{}/upload/{}", BASE_URL, created.token));
    assert_ne!(created.id, created.token);

    let request = get_request(&env.db, &created.token).unwrap();
    assert_eq!(request.owner_id, "bob");
    assert!(!request.is_consumed);
}

#[test]
fn test_unknown_token_is_not_found() {
    let env = setup();
    assert!(matches!(
        get_request(&env.db, "nosuchtoken12345"),
        Err(StoreError::NotFoundOrExpired)
    ));
}

#[test]
fn test_fulfill_mints_protected_share_and_notifies_owner() {
    let env = setup();
    let notifier = RecordingNotifier::default();
    let created = create_request(&env.db, "bob", 48, BASE_URL).unwrap();

    fulfill(
        &env.db,
        &env.uploads_dir,
        &created.token,
        UploadPayload::Text {
            text: "from the outside".to_string(),
        },
        SECRET,
        BASE_URL,
        &notifier,
    )
    .unwrap();

    let messages = notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    let (owner, url, password) = &messages[0];
    assert_eq!(owner, "bob");
    assert!(!password.is_empty());

    // The link plus the generated password are sufficient to view
    let (share_id, key, ptoken) = parse_view_url(url);
    let meta = get_metadata(&env.db, &share_id).unwrap();
    assert!(meta.has_password);

    let content = view_share(
        &env.db,
        &env.uploads_dir,
        &share_id,
        &key,
        Some(password),
        Some(&ptoken),
        SECRET,
    )
    .unwrap();
    assert!(matches!(content, ShareContent::Text(ref t) if t == "from the outside"));

    // The request is spent
    assert!(matches!(
        get_request(&env.db, &created.token),
        Err(StoreError::NotFoundOrExpired)
    ));
}

#[test]
fn test_fulfill_file_payload() {
    let env = setup();
    let notifier = RecordingNotifier::default();
    let created = create_request(&env.db, "bob", 48, BASE_URL).unwrap();

    fulfill(
        &env.db,
        &env.uploads_dir,
        &created.token,
        UploadPayload::File {
            data: b"inbound bytes".to_vec(),
            file_name: "drop.bin".to_string(),
            file_mime: "application/octet-stream".to_string(),
        },
        SECRET,
        BASE_URL,
        &notifier,
    )
    .unwrap();

    let messages = notifier.messages.lock().unwrap();
    let (_, url, password) = &messages[0];
    let (share_id, key, ptoken) = parse_view_url(url);

    let content = view_share(
        &env.db,
        &env.uploads_dir,
        &share_id,
        &key,
        Some(password),
        Some(&ptoken),
        SECRET,
    )
    .unwrap();
    match content {
        ShareContent::File { data, name, .. } => {
            assert_eq!(data, b"inbound bytes");
            assert_eq!(name, "drop.bin");
        }
        other => panic!("expected file content, got {:?}", other),
    }
}

#[test]
fn test_second_fulfill_creates_nothing() {
    let env = setup();
    let notifier = RecordingNotifier::default();
    let created = create_request(&env.db, "bob", 48, BASE_URL).unwrap();

    fulfill(
        &env.db,
        &env.uploads_dir,
        &created.token,
        UploadPayload::Text {
            text: "first".to_string(),
        },
        SECRET,
        BASE_URL,
        &notifier,
    )
    .unwrap();

    let second = fulfill(
        &env.db,
        &env.uploads_dir,
        &created.token,
        UploadPayload::Text {
            text: "second".to_string(),
        },
        SECRET,
        BASE_URL,
        &notifier,
    );
    assert!(matches!(second, Err(StoreError::NotFoundOrExpired)));

    let share_count: i64 = {
        let conn = env.db.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM shares", [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(share_count, 1);
    assert_eq!(notifier.messages.lock().unwrap().len(), 1);
}

#[test]
fn test_expired_request_cannot_be_fulfilled() {
    let env = setup();
    let notifier = RecordingNotifier::default();
    // TTL of zero hours expires immediately
    let created = create_request(&env.db, "bob", 0, BASE_URL).unwrap();

    let result = fulfill(
        &env.db,
        &env.uploads_dir,
        &created.token,
        UploadPayload::Text {
            text: "too late".to_string(),
        },
        SECRET,
        BASE_URL,
        &notifier,
    );
    assert!(matches!(result, Err(StoreError::NotFoundOrExpired)));

    let share_count: i64 = {
        let conn = env.db.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM shares", [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(share_count, 0);
}

#[test]
fn test_notification_failure_does_not_fail_upload() {
    let env = setup();
    let created = create_request(&env.db, "bob", 48, BASE_URL).unwrap();

    fulfill(
        &env.db,
        &env.uploads_dir,
        &created.token,
        UploadPayload::Text {
            text: "stored regardless".to_string(),
        },
        SECRET,
        BASE_URL,
        &FailingNotifier,
    )
    .unwrap();

    let share_count: i64 = {
        let conn = env.db.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM shares", [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(share_count, 1);
}

#[test]
fn test_sweep_removes_consumed_and_expired_requests() {
    let env = setup();
    let notifier = RecordingNotifier::default();

    let consumed = create_request(&env.db, "bob", 48, BASE_URL).unwrap();
    fulfill(
        &env.db,
        &env.uploads_dir,
        &consumed.token,
        UploadPayload::Text {
            text: "spent".to_string(),
        },
        SECRET,
        BASE_URL,
        &notifier,
    )
    .unwrap();

    let expired = create_request(&env.db, "bob", 0, BASE_URL).unwrap();
    let live = create_request(&env.db, "bob", 48, BASE_URL).unwrap();

    // Make sure the expired request's timestamp is actually in the past
    {
        let conn = env.db.lock().unwrap();
        conn.execute(
            "UPDATE dropbox_requests SET expires_at = ?1 WHERE id = ?2",
            rusqlite::params![(Utc::now() - Duration::minutes(1)).to_rfc3339(), expired.id],
        )
        .unwrap();
    }

    let removed = sweep_expired(&env.db).unwrap();
    assert_eq!(removed, 2);

    assert!(get_request(&env.db, &live.token).is_ok());
    assert!(matches!(
        get_request(&env.db, &expired.token),
        Err(StoreError::NotFoundOrExpired)
    ));
}
