/// Config file loading and creation for the trendrank CLI.
///
/// Config lives at ~/.config/trendrank/config.toml.
/// All fields are optional — CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default)]
pub struct TrendrankConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeframe: Option<String>,
    pub category: Option<u32>,
    pub gprop: Option<String>,
    pub geo: Option<String>,
    pub retries: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub cache: Option<String>,
    pub checkpoint_interval: Option<usize>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# trendrank configuration
# All values here can be overridden by CLI flags.

# Trends service endpoint
# endpoint = \"http://localhost:8600\"

# API key: use TRENDRANK_API_KEY env var or --api-key flag (not stored in config)

# Request window and filters, applied verbatim to every oracle call
# timeframe = \"all\"
# category = 16
# gprop = \"news\"
# geo = \"\"

# Max retries per oracle call before a throttle is treated as permanent
# retries = 3

# Per-request timeout in seconds
# timeout_secs = 30

# Cache file path
# cache = \"cache.json\"

# Save the cache after this many newly resolved keys
# checkpoint_interval = 25
";

/// Returns the default config path: ~/.config/trendrank/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("trendrank").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> TrendrankConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            toml::from_str(&content)
                .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => TrendrankConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> PathBuf {
    let path = config_path();

    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    // Create parent directories
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));

    path
}
