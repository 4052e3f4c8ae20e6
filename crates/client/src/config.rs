//! Connection settings for one MetaKube API endpoint.

use std::fmt;
use std::time::Duration;

use url::Url;

/// Endpoint, credentials and request timeout for a MetaKube API client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the MetaKube API (e.g. `https://metakube.syseleven.de`).
    pub endpoint: Url,

    /// Bearer token sent with every request.
    pub token: String,

    /// Timeout applied to each request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a config with the default timeout.
    pub fn new(endpoint: Url, token: impl Into<String>) -> Self {
        Self {
            endpoint,
            token: token.into(),
            timeout: default_timeout(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// The token never reaches logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub(crate) const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}
