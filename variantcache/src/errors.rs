use thiserror::Error;

use crate::LocalNode;

/// Errors produced by byte stores, the refresh engine and the collaborators
/// they call out to.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The refresh was aborted through its cancellation source.
    #[error("refresh cancelled")]
    Cancelled,

    /// The namespace or remote provider failed.
    #[error("provider failure: {0}")]
    ProviderFailure(String),

    /// A node could not be resolved, e.g. a child of a leaf.
    #[error("inconsistent tree: {0}")]
    Inconsistent(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal storage error: {0}")]
    StorageError(String),

    /// Some roots of a multi-root refresh failed. `changed` holds what the
    /// remaining roots reported.
    #[error("refresh failed for {} root(s)", failures.len())]
    RootsFailed {
        changed: Vec<LocalNode>,
        failures: Vec<(LocalNode, Error)>,
    },
}

impl Error {
    /// Cancellation aborts a whole operation, everything else is scoped to
    /// the root it happened in.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<url::ParseError> for Error {
    fn from(value: url::ParseError) -> Self {
        Error::InvalidRequest(format!("unable to parse url: {}", value))
    }
}

impl From<crate::path::PathComponentError> for Error {
    fn from(value: crate::path::PathComponentError) -> Self {
        Error::InvalidRequest(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::ProviderFailure(value.to_string())
    }
}
