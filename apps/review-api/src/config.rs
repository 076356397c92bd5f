//! Server configuration
//!
//! Flags fall back to environment variables, which may come from a `.env`
//! file loaded before parsing.

use std::time::Duration;

use clap::Parser;
use review_engine::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use review_engine::{GeminiConfig, RetryPolicy};

/// Uploads larger than this are rejected before entering the pipeline.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Command-line arguments for the contract review server
#[derive(Parser, Debug)]
#[command(name = "review-api")]
#[command(about = "Contract review API: classification, AI analysis and chat")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://contract-review.db")]
    pub database_url: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    /// Gemini model identifier
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    /// Timeout for a single model call in milliseconds
    #[arg(long, env = "AI_TIMEOUT_MS", default_value = "120000")]
    pub ai_timeout_ms: u64,

    /// Lifetime of blobs staged for classification
    #[arg(long, env = "CLASSIFY_BLOB_TTL_SECS", default_value = "3600")]
    pub classify_blob_ttl_secs: u64,

    /// Lifetime of blobs staged for analysis
    #[arg(long, env = "ANALYZE_BLOB_TTL_SECS", default_value = "120")]
    pub analyze_blob_ttl_secs: u64,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Re-ask the model when it rejects an analysis for recitation
    #[arg(long, env = "RETRY_RECITATION")]
    pub retry_recitation: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            database_url: self.database_url.clone(),
            ai_timeout: Duration::from_millis(self.ai_timeout_ms),
            classify_blob_ttl: Duration::from_secs(self.classify_blob_ttl_secs),
            analyze_blob_ttl: Duration::from_secs(self.analyze_blob_ttl_secs),
            max_upload_bytes: self.max_upload_bytes,
            recitation_retry: self.retry_recitation.then(RetryPolicy::default),
            ..ServerConfig::default()
        }
    }
}

/// Runtime settings, independent of how they were supplied.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub ai_timeout: Duration,
    pub classify_blob_ttl: Duration,
    pub analyze_blob_ttl: Duration,
    pub blob_sweep_interval: Duration,
    pub max_upload_bytes: usize,
    pub recitation_retry: Option<RetryPolicy>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: "sqlite::memory:".to_string(),
            ai_timeout: Duration::from_secs(120),
            classify_blob_ttl: Duration::from_secs(3600),
            analyze_blob_ttl: Duration::from_secs(120),
            blob_sweep_interval: Duration::from_secs(30),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            recitation_retry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_map_onto_config() {
        let args = Args::try_parse_from([
            "review-api",
            "--gemini-api-key",
            "secret",
            "--port",
            "8080",
            "--ai-timeout-ms",
            "5000",
            "--retry-recitation",
        ])
        .unwrap();

        let config = args.server_config();

        assert_eq!(config.port, 8080);
        assert_eq!(config.ai_timeout, Duration::from_secs(5));
        assert_eq!(config.analyze_blob_ttl, Duration::from_secs(120));
        assert_eq!(config.classify_blob_ttl, Duration::from_secs(3600));
        assert_eq!(config.recitation_retry, Some(RetryPolicy::default()));
        assert_eq!(args.gemini().api_key, "secret");
    }
}
