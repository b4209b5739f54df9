//! Runtime configuration loaded from the environment.
//!
//! Everything has a default except the provider credentials, which default
//! to empty strings and simply produce rejected upstream calls until set.

use std::env;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default directory for snapshot exports.
const DEFAULT_EXPORT_DIR: &str = "data/generated";

/// Service settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Port the HTTP server binds to.
    pub port: u16,

    /// Directory snapshot files are written under.
    pub export_dir: String,

    /// API key for the base-station registry.
    pub base_station_api_key: String,

    /// Shared service key for the public data portal (weather and hazard
    /// APIs).
    pub public_data_api_key: String,

    /// SGIS consumer key.
    pub sgis_consumer_key: String,

    /// SGIS consumer secret.
    pub sgis_consumer_secret: String,
}

impl Settings {
    /// Read settings from `RIDGELINE_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            port: env::var("RIDGELINE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            export_dir: env::var("RIDGELINE_EXPORT_DIR")
                .unwrap_or_else(|_| DEFAULT_EXPORT_DIR.to_string()),
            base_station_api_key: env::var("RIDGELINE_BASE_STATION_API_KEY")
                .unwrap_or_default(),
            public_data_api_key: env::var("RIDGELINE_PUBLIC_DATA_API_KEY").unwrap_or_default(),
            sgis_consumer_key: env::var("RIDGELINE_SGIS_CONSUMER_KEY").unwrap_or_default(),
            sgis_consumer_secret: env::var("RIDGELINE_SGIS_CONSUMER_SECRET").unwrap_or_default(),
        }
    }
}
