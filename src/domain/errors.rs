//! Domain error types
//!
//! This module defines the error hierarchy for fhirdesk. All errors are
//! domain-specific and don't expose third-party types (HTTP client, JSON parser).

use thiserror::Error;

/// Main fhirdesk error type
///
/// Every fallible operation of the client core returns this type, so callers
/// (the CLI or any other front end) can match on the failure category and
/// render it without knowing about the transport underneath.
#[derive(Debug, Error)]
pub enum FhirError {
    /// Caller-level misuse: empty id, malformed search criterion, missing id on update
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload could not be decoded into the expected resource
    #[error("Malformed resource: {0}")]
    MalformedResource(String),

    /// Server rejected the submitted content (400, 409, 412, 422 and other 4xx)
    #[error("Validation error ({status}): {message}")]
    Validation { status: u16, message: String },

    /// Server has no such resource (404, 410)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Network, timeout or server-side (5xx) failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Server refused the credentials (401, 403)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation was cancelled by the caller before a page was delivered
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl FhirError {
    /// Returns true when the error means the resource does not exist on the server
    pub fn is_not_found(&self) -> bool {
        matches!(self, FhirError::NotFound(_))
    }

    /// Returns the transport failure kind, if this is a transport error
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            FhirError::Transport(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, TLS handshake failure
    Connection,
    /// Request exceeded the configured or caller-supplied timeout
    Timeout,
    /// Server answered with a 5xx status
    Server,
    /// Server answered with something that is not a usable HTTP/FHIR response
    InvalidResponse,
}

/// Transport-level errors
///
/// Errors that occur below the resource layer. These don't expose
/// third-party HTTP client types.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to connect to the FHIR server
    #[error("Failed to connect to FHIR server: {0}")]
    ConnectionFailed(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Returns the failure category
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::ConnectionFailed(_) => TransportErrorKind::Connection,
            TransportError::Timeout(_) => TransportErrorKind::Timeout,
            TransportError::ServerError { .. } => TransportErrorKind::Server,
            TransportError::InvalidResponse(_) => TransportErrorKind::InvalidResponse,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for FhirError {
    fn from(err: std::io::Error) -> Self {
        FhirError::Io(err.to_string())
    }
}

// A JSON error surfacing outside the codec means a payload failed to decode
impl From<serde_json::Error> for FhirError {
    fn from(err: serde_json::Error) -> Self {
        FhirError::MalformedResource(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FhirError {
    fn from(err: toml::de::Error) -> Self {
        FhirError::Configuration(format!("TOML parse error: {err}"))
    }
}
