use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::render::fonts;

/// Application configuration loaded from environment variables.
/// Every variable is optional and has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory holding the TTF font family used by the renderer.
    pub font_dir: PathBuf,
    /// When set, requests without a photo field are rejected outright.
    pub require_photo: bool,
    /// Upper bound for multipart request bodies, in mebibytes.
    pub max_upload_mb: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3010".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            font_dir: fonts::default_font_dir(),
            require_photo: env_flag("REQUIRE_PHOTO"),
            max_upload_mb: std::env::var("MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_MB must be an integer")?,
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
