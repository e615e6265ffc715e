use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default Gemini model used for guide generation.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Application configuration loaded from environment variables.
///
/// The provider credential is optional at startup: a missing key surfaces as a
/// configuration error on each guide request rather than preventing the server
/// (health checks, PDF export) from coming up.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub allowed_states_path: PathBuf,
    /// GeoLite2 City database. Geofencing is disabled when unset.
    pub geoip_db_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            allowed_states_path: optional_env("ALLOWED_STATES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("allowed_states.txt")),
            geoip_db_path: optional_env("GEOIP_DB_PATH").map(PathBuf::from),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads an env var, treating empty values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
