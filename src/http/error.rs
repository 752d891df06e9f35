//! Error taxonomy for backend calls.
//!
//! Every failed logical call ends as exactly one [`ApiError`] whose
//! [`ErrorKind`] comes from a fixed set. Transport failures, HTTP statuses,
//! undecodable bodies and `code != 0` envelopes all land here.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No HTTP response was received (connection refused, DNS, reset).
    Network,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    RateLimit,
    Internal,
    BadGateway,
    ServiceUnavailable,
    /// Gateway timeout or the local deadline elapsed.
    Timeout,
    /// Any other non-success status.
    Http,
    /// The body could not be decoded into the expected shape.
    Decode,
    /// HTTP succeeded but the envelope carried `code != 0`.
    Rejected,
}

impl ErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => ErrorKind::Network,
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            422 => ErrorKind::Validation,
            429 => ErrorKind::RateLimit,
            500 => ErrorKind::Internal,
            502 => ErrorKind::BadGateway,
            503 => ErrorKind::ServiceUnavailable,
            504 => ErrorKind::Timeout,
            _ => ErrorKind::Http,
        }
    }

    /// Stable code used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::BadGateway => "BAD_GATEWAY",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Http => "HTTP_ERROR",
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::Rejected => "REJECTED",
        }
    }

    /// Default user-facing text when the backend gave no message.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Could not connect to the server",
            ErrorKind::BadRequest => "Invalid request",
            ErrorKind::Unauthorized => "Not authorized, please sign in again",
            ErrorKind::Forbidden => "Access denied",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Conflict => "Data conflict",
            ErrorKind::Validation => "Validation error",
            ErrorKind::RateLimit => "Too many requests",
            ErrorKind::Internal => "Internal server error, try again later",
            ErrorKind::BadGateway => "Server unavailable",
            ErrorKind::ServiceUnavailable => "Service unavailable, try again later",
            ErrorKind::Timeout => "Request timed out",
            ErrorKind::Http => "Unexpected HTTP error",
            ErrorKind::Decode => "Unexpected response from the server",
            ErrorKind::Rejected => "The server rejected the request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified failure of one logical call (after retries).
#[derive(Debug, Clone, Error)]
#[error("{kind} on {method} {url}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Envelope `code` for [`ErrorKind::Rejected`].
    pub code: Option<i64>,
    pub method: String,
    pub url: String,
    /// Backend message if one was sent, else the kind's default text.
    pub message: String,
    pub request_id: Option<Uuid>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, method: &str, url: &str, message: Option<String>) -> Self {
        Self {
            kind,
            status: None,
            code: None,
            method: method.to_string(),
            url: url.to_string(),
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| kind.user_message().to_string()),
            request_id: None,
        }
    }

    /// Error for a non-success HTTP status.
    pub fn from_status(status: u16, method: &str, url: &str, message: Option<String>) -> Self {
        let mut err = Self::new(ErrorKind::from_status(status), method, url, message);
        err.status = Some(status);
        err
    }

    /// Error for a `code != 0` envelope.
    pub fn rejected(code: i64, method: &str, url: &str, message: Option<String>) -> Self {
        let mut err = Self::new(ErrorKind::Rejected, method, url, message);
        err.code = Some(code);
        err
    }

    pub fn with_request_id(mut self, id: Uuid) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}
