//! Error types for instance-dns-sync.

use thiserror::Error;

/// Errors that can occur while reconciling an instance event.
#[derive(Debug, Error)]
pub enum SyncError {
    /// IO error (event feed, file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error talking to the zone service
    #[error("zone service transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Zone service rejected the request
    #[error("zone service returned {status}: {message}")]
    Api {
        /// HTTP status code from the zone service.
        status: u16,
        /// Error body, as returned by the service.
        message: String,
    },

    /// Notification payload is missing a required field or has the wrong shape
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// True when the failure came from the zone service rather than from
    /// the notification itself. The dispatch boundary uses this to pick
    /// the right metrics outcome.
    pub fn is_zone_service(&self) -> bool {
        matches!(self, SyncError::Http(_) | SyncError::Api { .. })
    }
}
