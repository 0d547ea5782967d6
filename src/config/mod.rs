//! Configuration module for the diária backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file holding the form state
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Gemini API key; report improvement keeps the original notes without one
    pub gemini_api_key: Option<String>,
    /// Model used for report improvement
    pub gemini_model: String,
    /// Base URL of the Gemini REST API
    pub gemini_base_url: String,
    /// Request timeout for a single improvement call
    pub improve_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("DIARIA_DB_PATH")
            .unwrap_or_else(|_| "./data/diaria.sqlite".to_string())
            .into();

        let bind_addr = env::var("DIARIA_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid DIARIA_BIND_ADDR format");

        let log_level = env::var("DIARIA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let gemini_model =
            env::var("DIARIA_GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        let gemini_base_url = env::var("DIARIA_GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());

        let improve_timeout = env::var("DIARIA_IMPROVE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Self {
            db_path,
            bind_addr,
            log_level,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            improve_timeout,
        }
    }
}
