use thiserror::Error;

/// Coarse classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response.
    NetworkFailure,
    /// The provider answered, but with a non-success status or a body that is not usable JSON.
    UpstreamError,
    /// The JSON was valid but an expected field was missing or had the wrong type.
    ShapeMismatch,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach {provider}: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed: {reason}")]
    Upstream { provider: &'static str, reason: String },

    #[error("Unexpected {provider} response shape: {reason}")]
    ShapeMismatch { provider: &'static str, reason: String },
}

impl FetchError {
    pub fn upstream(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::Upstream { provider, reason: reason.into() }
    }

    pub fn shape(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch { provider, reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. } => ErrorKind::NetworkFailure,
            FetchError::Upstream { .. } => ErrorKind::UpstreamError,
            FetchError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            FetchError::Network { provider, .. }
            | FetchError::Upstream { provider, .. }
            | FetchError::ShapeMismatch { provider, .. } => provider,
        }
    }
}
