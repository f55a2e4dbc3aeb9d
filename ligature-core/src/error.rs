// Error types for the Ligature binding layer

use crate::HttpStatus;
use thiserror::Error;

/// Errors surfaced by argument resolution and response shaping.
#[derive(Error, Debug)]
pub enum Error {
    /// No binding strategy could produce a value and no default exists.
    /// This is a handler-side failure, not a bad request.
    #[error(
        "{kind} \"{slot}\" cannot be resolved. The request does not contain relevant data and the \"{parameter}\" argument does not have a default value"
    )]
    UnresolvableParameter {
        kind: &'static str,
        slot: String,
        parameter: String,
    },

    /// Client input error, e.g. validation violations on a request body.
    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// Handler misconfiguration: unknown format key, unresolvable response
    /// type key. Hard failure at the point of use.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed client input rejected before it reached a handler.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) => HttpStatus::BadRequest.code(),
            Error::Deserialization(_) => HttpStatus::BadRequest.code(),

            // Resolution and configuration failures are server-side faults
            _ => HttpStatus::InternalServerError.code(),
        }
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        HttpStatus::from_code(self.status_code()).unwrap_or(HttpStatus::InternalServerError)
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }
}

/// Failure reported by a pluggable collaborator (serializer, denormalizer,
/// validator, entity lookup).
///
/// Plain failures are recovered locally by the resolver (treated as "value
/// not found", falling through to default-value policy). Failures already
/// classified at the HTTP level are re-thrown unchanged.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Failure(String),

    #[error(transparent)]
    Http(Error),
}

impl ServiceError {
    /// Create a plain, locally-recoverable failure
    pub fn failure(message: impl Into<String>) -> Self {
        ServiceError::Failure(message.into())
    }

    /// Wrap an HTTP-classified error that must propagate unchanged
    pub fn http(error: Error) -> Self {
        ServiceError::Http(error)
    }

    /// Check whether this failure carries an HTTP classification
    pub fn is_http(&self) -> bool {
        matches!(self, ServiceError::Http(_))
    }
}
