//! Error types for the MetaKube client crate.

use thiserror::Error;

/// Result type for Projects API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors returned by a [`ProjectsApi`](crate::ProjectsApi) implementation.
///
/// The reconciler only ever distinguishes [`ApiError::NotFound`] from
/// everything else; the remaining variants exist so the wrapped cause stays
/// readable.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The project does not exist remotely.
    #[error("project '{id}' not found")]
    NotFound { id: String },

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("invalid response: {reason}")]
    Decode { reason: String },

    /// The configured endpoint cannot address projects.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Transport-level failure from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Create an invalid endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Whether the remote reported the project as absent.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised while resolving a provider config reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No configuration exists under the referenced name.
    #[error("provider config '{name}' not found")]
    NotFound { name: String },

    /// The configuration exists but cannot be used.
    #[error("provider config '{name}' is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

impl ResolveError {
    /// Create a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a malformed config error.
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
