//! Error types for the esclient client.

use esclient_core::ParseAnomaly;
use thiserror::Error;

use crate::transport::HttpResponse;

/// Errors that can occur when using the esclient client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server answered with a non-2xx status.
    #[error("Server error: {status} {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason phrase for the status.
        reason: String,
        /// Raw response body, kept for diagnostics such as version conflicts.
        body: String,
    },

    /// No HTTP exchange took place.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] ParseAnomaly),

    /// Caller input that cannot be sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// HTTP status of the failed exchange, 0 when none took place.
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Status { status, .. } => *status,
            _ => 0,
        }
    }

    /// Raw body returned by the server, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }

    /// Optimistic concurrency failures surface as 409.
    pub fn is_conflict(&self) -> bool {
        self.status() == 409
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Gate a response on its status: 2xx passes through, anything else becomes
/// [`ClientError::Status`] carrying the reason phrase and raw body.
pub fn check_status(context: &str, response: HttpResponse) -> Result<HttpResponse> {
    tracing::info!("{}: {}, {}", context, response.status, response.reason);

    if response.is_success() {
        return Ok(response);
    }

    Err(ClientError::Status {
        status: response.status,
        reason: response.reason,
        body: response.body,
    })
}
