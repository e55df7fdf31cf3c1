//! Notification seam for the mail-sending collaborator.

/// Delivers the view link and generated password for a fulfilled drop-box
/// request to its owner. Implementations resolve the opaque owner id to a
/// real recipient (e.g. an email address); the store treats delivery as
/// best-effort.
pub trait Notifier: Send + Sync {
    fn upload_received(&self, owner_id: &str, view_url: &str, password: &str)
        -> std::result::Result<(), String>;
}

/// Default notifier: records the event in the log. Stands in when no mail
/// collaborator is wired up. The password is deliberately not logged.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn upload_received(
        &self,
        owner_id: &str,
        view_url: &str,
        _password: &str,
    ) -> std::result::Result<(), String> {
        tracing::info!("Upload received for owner {}: {}", owner_id, view_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_always_delivers() {
        let notifier = LogNotifier;
        assert!(notifier
            .upload_received("owner-1", "https://example.com/view/abc#key", "pw")
            .is_ok());
    }
}
