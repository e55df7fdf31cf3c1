//! Background cleanup task purging expired and consumed entities.
//!
//! Not required for correctness of the guarded read paths — those gate on
//! the same predicate — only for storage reclamation. Runs once eagerly at
//! startup, then on a fixed interval indefinitely.

use std::sync::Arc;
use std::time::Duration;

use crate::db::DbPool;
use crate::{dropbox, shares};

/// An external store the cleanup job also sweeps on every pass (e.g. the
/// session store owned by the surrounding service layer).
pub trait Sweep: Send + Sync {
    fn name(&self) -> &str;
    fn sweep_expired(&self) -> std::result::Result<usize, String>;
}

/// One full cleanup pass over shares, drop-box requests, and registered
/// collaborator stores. Per-store failures are logged and do not stop the
/// pass. Returns the total number of entities removed.
pub fn run_sweep(db: &DbPool, uploads_dir: &str, collaborators: &[Box<dyn Sweep>]) -> usize {
    let mut total = 0;

    match shares::store::sweep_expired(db, uploads_dir) {
        Ok(count) => {
            if count > 0 {
                tracing::info!("Cleanup: purged {} expired shares", count);
            }
            total += count;
        }
        Err(e) => tracing::error!("Share cleanup error: {}", e),
    }

    match dropbox::store::sweep_expired(db) {
        Ok(count) => {
            if count > 0 {
                tracing::info!("Cleanup: purged {} expired drop-box requests", count);
            }
            total += count;
        }
        Err(e) => tracing::error!("Drop-box cleanup error: {}", e),
    }

    for collaborator in collaborators {
        match collaborator.sweep_expired() {
            Ok(count) => {
                if count > 0 {
                    tracing::info!("Cleanup: purged {} from {}", count, collaborator.name());
                }
                total += count;
            }
            Err(e) => tracing::error!("{} cleanup error: {}", collaborator.name(), e),
        }
    }

    total
}

/// Spawn the periodic cleanup task: one eager pass at startup, then one
/// every `interval_secs` seconds.
pub fn spawn_cleanup_job(
    db: DbPool,
    uploads_dir: String,
    interval_secs: u64,
    collaborators: Vec<Box<dyn Sweep>>,
) {
    let interval = Duration::from_secs(interval_secs);
    let collaborators = Arc::new(collaborators);

    tokio::spawn(async move {
        loop {
            let db_clone = db.clone();
            let dir_clone = uploads_dir.clone();
            let collabs = collaborators.clone();

            match tokio::task::spawn_blocking(move || {
                run_sweep(&db_clone, &dir_clone, &collabs)
            })
            .await
            {
                Ok(total) => {
                    if total == 0 {
                        tracing::debug!("Cleanup pass: nothing to remove");
                    }
                }
                Err(e) => {
                    tracing::error!("Cleanup task join error: {}", e);
                }
            }

            tokio::time::sleep(interval).await;
        }
    });
}
