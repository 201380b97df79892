// config.rs - Bot Configuration
// Reads botconfig.txt (KEY=VALUE, '#' comments) from the first of several
// candidate locations and turns it into a typed BotConfig.
//
// Used by: main.rs (startup), fetch.rs (deadlines, scratch root)

use crate::error::ConfigError;
use log::debug;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MB: u64 = 1024 * 1024;

const CONFIG_PATHS: [&str; 4] = [
    "botconfig.txt",
    "../botconfig.txt",
    "../../botconfig.txt",
    "src/botconfig.txt",
];

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub prefix: String,
    pub owner_id: Option<u64>,
    pub max_upload_bytes: u64,
    pub soft_format_bytes: u64,
    pub default_timeout: Duration,
    pub slow_platform_timeout: Duration,
    pub max_concurrent_fetches: usize,
    pub yt_dlp_path: String,
    pub scratch_dir: PathBuf,
    pub messages_file: String,
    pub default_language: String,
}

/// Parse KEY=VALUE lines. Blank lines and '#' comments are skipped,
/// a leading BOM is ignored.
pub fn parse_config(content: &str) -> HashMap<String, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            config.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    config
}

fn number<T: std::str::FromStr + PartialOrd + Default>(
    config: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match config.get(key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(ConfigError::InvalidNumber {
                key: key.to_string(),
                value: raw.clone(),
            }),
        },
    }
}

/// A positive megabyte count, converted to bytes.
fn megabytes(config: &HashMap<String, String>, key: &str, default: u64) -> Result<u64, ConfigError> {
    number(config, key, default)?
        .checked_mul(MB)
        .ok_or_else(|| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: config.get(key).cloned().unwrap_or_default(),
        })
}

impl BotConfig {
    pub fn from_map(config: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let discord_token = config
            .get("DISCORD_TOKEN")
            .cloned()
            .or_else(|| env::var("DISCORD_TOKEN").ok())
            .filter(|t| !t.is_empty() && t != "YOUR_BOT_TOKEN_HERE")
            .ok_or(ConfigError::MissingToken)?;

        let owner_id = match config.get("BOT_OWNER_ID") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key: "BOT_OWNER_ID".to_string(),
                value: raw.clone(),
            })?),
            None => None,
        };

        let max_upload_bytes = megabytes(config, "MAX_UPLOAD_MB", 50)?;
        let soft_format_bytes = megabytes(config, "SOFT_FORMAT_MB", 48)?;

        Ok(Self {
            discord_token,
            prefix: config.get("PREFIX").cloned().unwrap_or_else(|| "^".to_string()),
            owner_id,
            max_upload_bytes,
            soft_format_bytes,
            default_timeout: Duration::from_secs(number(config, "DEFAULT_TIMEOUT_SECS", 120)?),
            slow_platform_timeout: Duration::from_secs(number(config, "SLOW_PLATFORM_TIMEOUT_SECS", 45)?),
            max_concurrent_fetches: number(config, "MAX_CONCURRENT_FETCHES", 8)?,
            yt_dlp_path: config.get("YT_DLP_PATH").cloned().unwrap_or_else(|| "yt-dlp".to_string()),
            scratch_dir: config
                .get("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            messages_file: config
                .get("MESSAGES_FILE")
                .cloned()
                .unwrap_or_else(|| "messages.json".to_string()),
            default_language: config
                .get("DEFAULT_LANGUAGE")
                .cloned()
                .unwrap_or_else(|| "en".to_string()),
        })
    }
}

/// Create the scratch root and resolve it to an absolute path. yt-dlp runs
/// with its working directory inside the scratch root, so relative paths
/// would resolve differently for it and for us.
pub fn prepare_scratch_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let scratch_error = |source| ConfigError::ScratchDir {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(path).map_err(scratch_error)?;
    fs::canonicalize(path).map_err(scratch_error)
}

/// Load botconfig.txt from the first location that exists.
pub fn load_bot_config() -> Result<BotConfig, ConfigError> {
    for config_path in &CONFIG_PATHS {
        match fs::read_to_string(config_path) {
            Ok(content) => {
                debug!("⚙️ Configuration read from {}", config_path);
                println!("✅ Configuration loaded from {}", config_path);
                return BotConfig::from_map(&parse_config(&content));
            }
            Err(_) => continue,
        }
    }

    Err(ConfigError::NotFound)
}
