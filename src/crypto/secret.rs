//! Server secret for token signing.

use std::path::Path;

use rand::Rng;

/// Load or generate the token-signing secret (256-bit random).
/// Stored as raw bytes at `{data_dir}/app_secret`; the secret must be
/// cryptographically random, never human-chosen.
pub fn load_or_generate_secret(data_dir: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let secret_path = Path::new(data_dir).join("app_secret");

    if secret_path.exists() {
        let secret = std::fs::read(&secret_path)?;
        if secret.len() == 32 {
            tracing::info!("Application secret loaded from {}", secret_path.display());
            return Ok(secret);
        }
        tracing::warn!(
            "Application secret file has wrong size ({}), regenerating",
            secret.len()
        );
    }

    let secret: [u8; 32] = rand::rng().random();
    std::fs::write(&secret_path, secret)?;
    tracing::info!("Application secret generated at {}", secret_path.display());
    Ok(secret.to_vec())
}
