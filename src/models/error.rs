//! Error types raised while translating between ALB events and HTTP objects.
//!
//! Every variant is terminal for the invocation: the adapter never retries, it
//! surfaces the error to the Lambda runtime which reports an invocation failure.
//! HTTP error statuses chosen by the handler are not errors here.

use std::fmt;

use lambda_runtime::Diagnostic;

/// Custom error type for the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Path and query string cannot form a valid request target
    MalformedUrl(String),
    /// Body flagged as base64 failed to decode
    MalformedBody(String),
    /// Header name or value cannot be represented in an HTTP header map
    MalformedHeader(String),
    /// Method is not a valid HTTP token
    MalformedMethod(String),
    /// The handler panicked while serving the request
    HandlerPanicked(String),
}

impl AdapterError {
    /// Stable error kind name, reported as the Lambda `errorType`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedUrl(_) => "MalformedURL",
            Self::MalformedBody(_) => "MalformedBody",
            Self::MalformedHeader(_) => "MalformedHeader",
            Self::MalformedMethod(_) => "MalformedMethod",
            Self::HandlerPanicked(_) => "HandlerPanicked",
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedUrl(msg) => write!(f, "Malformed URL: {msg}"),
            Self::MalformedBody(msg) => write!(f, "Malformed body: {msg}"),
            Self::MalformedHeader(msg) => write!(f, "Malformed header: {msg}"),
            Self::MalformedMethod(msg) => write!(f, "Malformed method: {msg}"),
            Self::HandlerPanicked(msg) => write!(f, "Handler panicked: {msg}"),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<AdapterError> for Diagnostic {
    fn from(error: AdapterError) -> Self {
        Self {
            error_type: error.kind().to_string(),
            error_message: error.to_string(),
        }
    }
}
