use sealdrop_server::config::{generate_config_template, Config};
use sealdrop_server::{cleanup, crypto, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sealdrop_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sealdrop_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("Sealdrop server v{} starting", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite database
    let db = db::init_db(&config.data_dir)?;

    // Ensure the token-signing secret exists before the first share is
    // created by the surrounding service layer
    crypto::secret::load_or_generate_secret(&config.data_dir)?;

    // Cleanup sweeper: eager pass at startup, then fixed interval
    let cleanup_config = config.cleanup.clone().unwrap_or_default();
    cleanup::spawn_cleanup_job(
        db.clone(),
        config.uploads_dir(),
        cleanup_config.interval_secs,
        Vec::new(),
    );
    tracing::info!(
        "Cleanup job scheduled every {} seconds",
        cleanup_config.interval_secs
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
