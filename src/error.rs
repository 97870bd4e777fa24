//! Error taxonomy for catalog requests.
//!
//! Every request issued by the data layer resolves to either a value or
//! exactly one [`ErrorKind`]. The set is closed; sessions forward kinds to the
//! shared [`ErrorHandler`](crate::report::ErrorHandler) unchanged.

use thiserror::Error;

/// Classified failure of a catalog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    /// DNS failure, unreachable host, lost connection, no connectivity.
    #[error("network connection failed")]
    Connectivity,

    /// The request did not complete in time.
    #[error("network request timed out")]
    Timeout,

    /// The server answered with a 5xx status.
    #[error("server error")]
    Server,

    /// The server rejected the request credentials (401/403).
    #[error("not authenticated")]
    NotAuthenticated,

    /// The requested resource does not exist (404).
    #[error("resource not found")]
    NotFound,

    /// Any other non-success HTTP status.
    #[error("unexpected HTTP status code")]
    HttpStatus,

    /// A success response that is not JSON.
    #[error("unexpected response content type")]
    UnexpectedContentType,

    /// A success response without a usable body.
    #[error("unexpected response payload")]
    UnexpectedPayload,

    /// The payload could not be decoded into entities.
    #[error("could not deserialize API entity")]
    Deserialization,

    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status code to an error kind. Success statuses map to `None`.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            401 | 403 => Some(ErrorKind::NotAuthenticated),
            404 => Some(ErrorKind::NotFound),
            500..=599 => Some(ErrorKind::Server),
            _ => Some(ErrorKind::HttpStatus),
        }
    }

    /// Stable identifier used in logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            ErrorKind::Connectivity => "connectivity",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Server => "server_error",
            ErrorKind::NotAuthenticated => "not_authenticated",
            ErrorKind::NotFound => "not_found",
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::UnexpectedContentType => "unexpected_content_type",
            ErrorKind::UnexpectedPayload => "unexpected_payload",
            ErrorKind::Deserialization => "deserialization",
            ErrorKind::Unknown => "unknown",
        }
    }
}
