use std::env;
use std::time::Duration;

use anyhow::Context;

use crate::artifacts::DEFAULT_MAX_IMAGE_BYTES;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Base URL of the generation service, without a trailing slash
    pub base_url: String,
    /// Per-request timeout; generation and cloth simulation take minutes
    pub timeout: Duration,
    pub max_image_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.localhost".to_string(),
            timeout: Duration::from_secs(600),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Read `.env` if present, then the process environment
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let base_url = lookup("FITROOM_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let timeout = match lookup("FITROOM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().with_context(|| {
                format!("FITROOM_TIMEOUT_SECS must be a number, got '{raw}'")
            })?),
            None => defaults.timeout,
        };

        let max_image_bytes = match lookup("FITROOM_MAX_IMAGE_BYTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("FITROOM_MAX_IMAGE_BYTES must be a number, got '{raw}'"))?,
            None => defaults.max_image_bytes,
        };

        Ok(Self {
            base_url,
            timeout,
            max_image_bytes,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
