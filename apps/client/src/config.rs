use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const SESSION_DIR: &str = "resume-client";
const SESSION_FILE: &str = "session.json";

/// Client configuration loaded from environment variables.
/// Every value has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the analysis service, without a trailing slash.
    pub api_url: String,
    pub session_file: PathBuf,
    pub http_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_url = std::env::var("RESUME_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let session_file = match std::env::var("RESUME_SESSION_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_file()?,
        };

        Ok(Config {
            api_url,
            session_file,
            http_timeout_secs: match std::env::var("HTTP_TIMEOUT_SECS") {
                Ok(raw) => raw
                    .parse::<u64>()
                    .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
                Err(_) => DEFAULT_TIMEOUT_SECS,
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn default_session_file() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .context("Could not determine a config directory; set RESUME_SESSION_FILE")?;
    Ok(base.join(SESSION_DIR).join(SESSION_FILE))
}
