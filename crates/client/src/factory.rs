//! Construction of one authenticated API client per reconciliation pass.

use crate::api::ProjectsApi;
use crate::client::HttpProjectsClient;
use crate::config::ClientConfig;
use crate::error::ApiResult;

/// Builds a [`ProjectsApi`] client for a resolved [`ClientConfig`].
///
/// Implementations must not contact the remote API; building a client only
/// binds a transport to an endpoint and credentials.
pub trait ClientFactory: Send + Sync {
    type Api: ProjectsApi;

    /// Build a client bound to `config`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`](crate::ApiError) when the config cannot back a client.
    fn new_client(&self, config: ClientConfig) -> ApiResult<Self::Api>;
}

/// Factory handing out [`HttpProjectsClient`]s over one pooled transport.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    transport: reqwest::Client,
}

impl HttpClientFactory {
    /// Create a factory with a fresh connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`](crate::ApiError::Http) if the transport cannot be built.
    pub fn new() -> ApiResult<Self> {
        let transport = reqwest::Client::builder()
            .user_agent(concat!("provider-metakube/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_transport(transport))
    }

    /// Create a factory over a caller-supplied transport.
    pub const fn with_transport(transport: reqwest::Client) -> Self {
        Self { transport }
    }
}

impl ClientFactory for HttpClientFactory {
    type Api = HttpProjectsClient;

    fn new_client(&self, config: ClientConfig) -> ApiResult<Self::Api> {
        HttpProjectsClient::with_transport(self.transport.clone(), config)
    }
}
