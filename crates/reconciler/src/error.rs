//! Error types for the reconciler crate.

use std::fmt;

use metakube_client::{ApiError, ResolveError};
use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Step of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Observe,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Observe => write!(f, "observe"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Reconciler error types.
///
/// Every failure of an external call is tagged with the stage it happened
/// in. A missing project on describe is not an error; it is reported as an
/// absent resource.
#[derive(Debug, Error)]
pub enum Error {
    /// The record is not a Project.
    #[error("managed resource is not a {expected} custom resource (got {found})")]
    WrongRecordKind { expected: String, found: String },

    /// The record could not be decoded.
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// The referenced provider config could not be resolved.
    #[error("cannot resolve provider config: {0}")]
    ConfigResolution(#[from] ResolveError),

    /// No client could be built from the resolved config.
    #[error("cannot connect to MetaKube API: {reason}")]
    Connection { reason: String },

    #[error("cannot describe Project: {0}")]
    Describe(#[source] ApiError),

    #[error("cannot create Project: {0}")]
    Create(#[source] ApiError),

    #[error("cannot update Project: {0}")]
    Update(#[source] ApiError),

    #[error("cannot delete Project: {0}")]
    Delete(#[source] ApiError),

    /// The operation needs an external identity the record does not carry.
    #[error("cannot {stage} Project: external name is not set")]
    ExternalNameNotSet { stage: Stage },

    /// The caller cancelled the pass while `stage` was in flight.
    #[error("{stage} cancelled")]
    Cancelled { stage: Stage },

    /// The pass deadline elapsed while `stage` was in flight.
    #[error("{stage} exceeded the pass deadline")]
    DeadlineExceeded { stage: Stage },

    /// Invalid reconciler configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create a wrong record kind error.
    pub fn wrong_record_kind(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::WrongRecordKind {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Stage the error is attributed to, when it came from a pass step.
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::WrongRecordKind { .. } | Self::ConfigResolution(_) | Self::Connection { .. } => {
                Some(Stage::Connect)
            }
            Self::Describe(_) => Some(Stage::Observe),
            Self::Create(_) => Some(Stage::Create),
            Self::Update(_) => Some(Stage::Update),
            Self::Delete(_) => Some(Stage::Delete),
            Self::ExternalNameNotSet { stage }
            | Self::Cancelled { stage }
            | Self::DeadlineExceeded { stage } => Some(*stage),
            Self::InvalidRecord { .. } | Self::InvalidConfig { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_wraps_cause() {
        let err = Error::Describe(ApiError::status(500, "boom"));
        assert_eq!(err.to_string(), "cannot describe Project: API returned 500: boom");
        assert_eq!(err.stage(), Some(Stage::Observe));
    }

    #[test]
    fn test_external_name_not_set_display() {
        let err = Error::ExternalNameNotSet {
            stage: Stage::Delete,
        };
        assert_eq!(
            err.to_string(),
            "cannot delete Project: external name is not set"
        );
    }

    #[test]
    fn test_config_resolution_from() {
        let err: Error = ResolveError::not_found("default").into();
        assert!(err.to_string().contains("provider config 'default' not found"));
        assert_eq!(err.stage(), Some(Stage::Connect));
    }

    #[test]
    fn test_cancelled_display() {
        let err = Error::Cancelled {
            stage: Stage::Observe,
        };
        assert_eq!(err.to_string(), "observe cancelled");
    }
}
