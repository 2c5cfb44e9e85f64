use thiserror::Error;

/// Result type alias for forwarder operations
pub type Result<T, E = ForwarderError> = std::result::Result<T, E>;

/// Errors that can occur while forwarding requests
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Failed to build upstream request: {0}")]
    RequestBuildError(String),

    #[error("Failed to read response body: {0}")]
    ResponseBodyError(String),

    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Upstream timeout for {0}")]
    UpstreamTimeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),

    #[error("Region directory error: {0}")]
    Regions(#[from] regions::RegionError),

    #[error("Failed to build alarm client: {0}")]
    AlarmClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForwarderError {
    /// Whether the error was caused by the backend rather than by the request itself.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            ForwarderError::UpstreamRequestFailed(..)
                | ForwarderError::UpstreamTimeout(_)
                | ForwarderError::ResponseBodyError(_)
        )
    }
}
