//! Client configuration.

/// Environment variable naming the backend base URL.
pub const BACKEND_URL_ENV: &str = "MASKROOM_BACKEND_URL";

/// Fallback backend when the environment provides none.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Default message TTL in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 60;

/// Configuration consumed by the session driver.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; http(s) schemes are rewritten to ws(s) at connect
    /// time.
    pub backend_url: String,
    /// Default TTL for sent messages, in seconds. The session clamps values
    /// below [`maskroom_core::MIN_DEFAULT_TTL_SECONDS`].
    pub default_ttl_seconds: u64,
}

impl ClientConfig {
    /// Read configuration from the process environment, falling back to
    /// defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let backend_url = std::env::var(BACKEND_URL_ENV)
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        Self { backend_url, default_ttl_seconds: DEFAULT_TTL_SECONDS }
    }

    /// Configuration pointing at an explicit backend.
    pub fn with_backend(backend_url: impl Into<String>) -> Self {
        Self { backend_url: backend_url.into(), default_ttl_seconds: DEFAULT_TTL_SECONDS }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}
