use std::time::Duration;

use crate::error::{Result, TryOnError};

/// Default endpoint of the direct (single request) try-on model.
pub const DEFAULT_DIRECT_ENDPOINT: &str = "https://fal.run/fal-ai/fashn/tryon/v1.6";

/// Default queue endpoint of the prompt-driven image-editing model.
pub const DEFAULT_QUEUE_ENDPOINT: &str = "https://queue.fal.run/fal-ai/nano-banana/edit";

/// Environment variables checked by [`TryOnConfig::from_env`], in order.
pub const API_KEY_VARS: [&str; 2] = ["FAL_KEY", "FAL_API_KEY"];

/// Configuration for a [`crate::TryOnClient`].
///
/// Use [`TryOnConfig::builder()`] for ergonomic construction, or
/// [`TryOnConfig::from_env()`] to pick the API key up from the process
/// environment. The key is read once here and never again mid-flow.
#[derive(Clone)]
pub struct TryOnConfig {
    /// Provider API key. `None` makes every request fail validation.
    pub api_key: Option<String>,

    /// Endpoint of the direct provider.
    pub direct_endpoint: String,

    /// Submission endpoint of the queue provider.
    pub queue_endpoint: String,

    /// Wait between two status checks of a queued job.
    pub poll_interval: Duration,

    /// Status checks before a queued job is abandoned.
    pub max_poll_attempts: u32,

    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for TryOnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryOnConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("direct_endpoint", &self.direct_endpoint)
            .field("queue_endpoint", &self.queue_endpoint)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            direct_endpoint: DEFAULT_DIRECT_ENDPOINT.to_string(),
            queue_endpoint: DEFAULT_QUEUE_ENDPOINT.to_string(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl TryOnConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> TryOnConfigBuilder {
        TryOnConfigBuilder::default()
    }

    /// Defaults, with the API key taken from `FAL_KEY` or `FAL_API_KEY`.
    pub fn from_env() -> Self {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty());
        Self {
            api_key,
            ..Default::default()
        }
    }

    /// The API key, or a validation error if none is configured.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(TryOnError::Validation("Missing API key".into())),
        }
    }
}

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Builder for [`TryOnConfig`].
#[derive(Default)]
pub struct TryOnConfigBuilder {
    config: TryOnConfig,
}

impl TryOnConfigBuilder {
    /// Set the provider API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Override the direct provider endpoint.
    pub fn with_direct_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.direct_endpoint = normalize(endpoint.into());
        self
    }

    /// Override the queue provider submission endpoint.
    pub fn with_queue_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.queue_endpoint = normalize(endpoint.into());
        self
    }

    /// Set the wait between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the number of status checks before a job times out.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.config.max_poll_attempts = attempts;
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the final [`TryOnConfig`].
    pub fn build(self) -> TryOnConfig {
        self.config
    }
}
