//! Application configuration
//!
//! Explicit configuration read once at process start; handlers never look
//! anything up from the environment.

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Directory uploaded media files are written under
    pub media_root: PathBuf,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR`: listen address (default: 0.0.0.0:3000)
    /// - `MEDIA_ROOT`: media directory (default: media)
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));

        Self {
            bind_addr,
            media_root,
        }
    }
}
