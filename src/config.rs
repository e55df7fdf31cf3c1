use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Sealdrop content-store daemon
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(
    name = "sealdrop-server",
    version,
    about = "Envelope-encrypted ephemeral content store"
)]
pub struct Config {
    /// Public base URL used when constructing share and upload links
    #[arg(long, env = "SEALDROP_BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./sealdrop.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "SEALDROP_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for persistent state (DB, secret, uploads)
    #[arg(long, env = "SEALDROP_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Cleanup sweeper configuration (loaded from [cleanup] section in TOML)
    #[arg(skip)]
    #[serde(default)]
    pub cleanup: Option<CleanupConfig>,

    /// Drop-box configuration (loaded from [dropbox] section in TOML)
    #[arg(skip)]
    #[serde(default)]
    pub dropbox: Option<DropboxConfig>,
}

/// Configuration for the background cleanup sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Interval in seconds between cleanup passes (default: 300 = 5 minutes)
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
        }
    }
}

fn default_cleanup_interval() -> u64 {
    300
}

/// Configuration for drop-box upload requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxConfig {
    /// Default request lifetime in hours (default: 48)
    #[serde(default = "default_dropbox_ttl")]
    pub default_ttl_hours: i64,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            default_ttl_hours: 48,
        }
    }
}

fn default_dropbox_ttl() -> i64 {
    48
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            config: "./sealdrop.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            cleanup: None,
            dropbox: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (SEALDROP_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("SEALDROP_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }

    /// Directory holding encrypted file-share blobs.
    pub fn uploads_dir(&self) -> String {
        format!("{}/uploads", self.data_dir)
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Sealdrop Server Configuration
# Place this file at ./sealdrop.toml or specify with --config <path>
# All settings can be overridden via environment variables (SEALDROP_BASE_URL, etc.)
# or CLI flags (--base-url, etc.)

# Public base URL used when constructing share and upload links
# base_url = "http://localhost:3000"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the SQLite database, signing secret, and encrypted uploads
# data_dir = "./data"

# ---- Cleanup Sweeper ----
# [cleanup]

# Interval in seconds between cleanup passes (default: 300 = 5 minutes)
# interval_secs = 300

# ---- Drop-Box Requests ----
# [dropbox]

# Default upload-request lifetime in hours (default: 48)
# default_ttl_hours = 48
"#
    .to_string()
}
