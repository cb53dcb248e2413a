//! Client configuration.
//!
//! Configuration is read from environment variables (`NOTARIUM_*` prefixed),
//! falling back to the shared defaults. `.env` loading is the binary's
//! responsibility.

use notarium_core::{defaults, Error, Result};

/// Configuration for the REST client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend's `/api` surface.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Default number of retrieved chunks per RAG query.
    pub top_k: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_BASE_URL.to_string(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            top_k: defaults::RAG_TOP_K,
        }
    }
}

impl ClientConfig {
    /// Create from environment variables.
    ///
    /// - `NOTARIUM_API_BASE`: backend base URL
    /// - `NOTARIUM_TIMEOUT_SECS`: request timeout
    /// - `NOTARIUM_TOP_K`: RAG retrieval depth
    pub fn from_env() -> Self {
        let base_url = std::env::var("NOTARIUM_API_BASE")
            .unwrap_or_else(|_| defaults::API_BASE_URL.to_string());
        let timeout_secs = std::env::var("NOTARIUM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS);
        let top_k = std::env::var("NOTARIUM_TOP_K")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults::RAG_TOP_K);

        Self {
            base_url,
            timeout_secs,
            top_k,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base_url cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        if self.top_k == 0 {
            return Err(Error::Config("top_k must be positive".to_string()));
        }
        Ok(())
    }
}
