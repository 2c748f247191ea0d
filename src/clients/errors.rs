//! HTTP-level error types.
//!
//! - [`HttpResponseError`]: a non-2xx response
//! - [`HttpError`]: every failure the wire layer can report
//!
//! The text of a response error follows the `"{code} {reason} body: {body}"`
//! shape (for example `401 Unauthorized body: ...`), which the retry
//! classifier relies on.
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql::clients::HttpResponseError;
//!
//! let error = HttpResponseError {
//!     code: 403,
//!     message: r#"{"errors":"Access denied"}"#.to_string(),
//!     error_reference: None,
//! };
//! assert_eq!(error.to_string(), r#"403 Forbidden body: {"errors":"Access denied"}"#);
//! ```

use thiserror::Error;

/// A non-successful HTTP response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code} {} body: {message}", canonical_reason(.code))]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// The raw response body.
    pub message: String,
    /// Reference ID for error reporting (from the `X-Request-Id` header).
    pub error_reference: Option<String>,
}

fn canonical_reason(code: &u16) -> &'static str {
    reqwest::StatusCode::from_u16(*code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown Status")
}

/// Unified error type for the wire layer.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx response whose body is not valid JSON.
    #[error("Invalid response body (status {code}): {source}")]
    InvalidBody {
        /// The HTTP status code.
        code: u16,
        /// The JSON parse error.
        source: serde_json::Error,
    },
}

impl HttpError {
    /// Returns the HTTP status code, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(error) => Some(error.code),
            Self::Network(error) => error.status().map(|status| status.as_u16()),
            Self::InvalidBody { code, .. } => Some(*code),
        }
    }
}
