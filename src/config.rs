use std::{env, fs, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Result;

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent";

pub const DEFAULT_SUGGESTION_FORM_URL: &str =
    "https://docs.google.com/forms/d/e/1FAIpQLSfE1oSG7RHEnSA2RGYLP-2VJEU5eGvA8dsaUqHrtqIgMdKwXA/formResponse";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub catalog_source: String,
    pub bookmarks_path: PathBuf,
    pub suggestion_form_url: String,
    pub suggestion_ack_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(3000);
        let fallback_addr = SocketAddr::from(([0, 0, 0, 0], port));
        let bind_addr = env::var("DEVTOOLBOX_BIND_ADDR")
            .ok()
            .map(|raw| raw.trim().trim_matches('"').trim_matches('\'').to_string())
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or(fallback_addr);

        let gemini_api_url = env::var("GEMINI_API_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string());

        let catalog_source =
            env::var("DEVTOOLBOX_CATALOG").unwrap_or_else(|_| "tools.json".to_string());

        let bookmarks_path = PathBuf::from(
            env::var("DEVTOOLBOX_BOOKMARKS_PATH")
                .unwrap_or_else(|_| "devtoolbox-bookmarks.json".to_string()),
        );

        let suggestion_form_url = env::var("DEVTOOLBOX_SUGGESTION_FORM_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SUGGESTION_FORM_URL.to_string());

        let suggestion_ack_delay = env::var("DEVTOOLBOX_SUGGESTION_ACK_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(1000));

        Ok(Self {
            bind_addr,
            gemini_api_key: resolve_gemini_api_key(),
            gemini_api_url,
            catalog_source,
            bookmarks_path,
            suggestion_form_url,
            suggestion_ack_delay,
        })
    }
}

/// The key is optional at startup; requests report its absence instead.
fn resolve_gemini_api_key() -> Option<String> {
    if let Ok(value) = env::var("GEMINI_API_KEY") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    let key_file = env::var("GEMINI_API_KEY_FILE").ok()?;
    match fs::read_to_string(&key_file) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                tracing::warn!("GEMINI_API_KEY_FILE is empty: {}", key_file);
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(err) => {
            tracing::warn!("Failed reading GEMINI_API_KEY_FILE at {}: {}", key_file, err);
            None
        }
    }
}
