//! GraphQL transport error types.
//!
//! A call can fail in four distinct ways, each a separate variant of
//! [`GraphqlError`]:
//!
//! - [`GraphqlError::Http`]: network failure or non-2xx status
//! - [`GraphqlError::Graphql`]: a well-formed response with a non-empty
//!   `errors` array (any partial `data` is kept)
//! - [`GraphqlError::UserErrors`]: a successful mutation whose payload carries
//!   domain-level validation errors
//! - [`GraphqlError::Decode`] / [`GraphqlError::MissingData`]: the `data`
//!   field does not fit the requested output shape
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql::clients::graphql::{GraphqlError, GraphqlErrorDetail};
//!
//! let error = GraphqlError::Graphql {
//!     errors: vec![GraphqlErrorDetail::new("Field 'nope' doesn't exist on type 'Shop'")],
//!     data: None,
//! };
//! assert_eq!(error.to_string(), "Field 'nope' doesn't exist on type 'Shop'");
//! ```

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::clients::HttpError;

/// Position in the query text an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorLocation {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

/// One entry of a response's `errors` array.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GraphqlErrorDetail {
    /// Human-readable message.
    pub message: String,
    /// Source locations in the query, if reported.
    #[serde(default)]
    pub locations: Vec<ErrorLocation>,
    /// Path to the failing field, if reported.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
    /// Vendor extensions (e.g. `code`).
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl GraphqlErrorDetail {
    /// Creates an error entry with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }
}

impl fmt::Display for GraphqlErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A domain-level validation error inside a mutation payload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserError {
    /// Path to the offending input field.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) if !field.is_empty() => write!(f, "{}: {}", field.join("."), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error type for GraphQL transport calls.
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The response carried a non-empty `errors` array.
    #[error("{}", join(.errors))]
    Graphql {
        /// The reported errors, in response order.
        errors: Vec<GraphqlErrorDetail>,
        /// Partial data returned alongside the errors.
        data: Option<serde_json::Value>,
    },

    /// The mutation payload carried user errors.
    #[error("user errors: {}", join(.0))]
    UserErrors(Vec<UserError>),

    /// The `data` field could not be decoded into the requested type.
    #[error("failed to decode GraphQL data: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response had neither `data` nor `errors`.
    #[error("GraphQL response contains no data")]
    MissingData,
}

impl GraphqlError {
    /// Returns the GraphQL error entries, if this is a [`GraphqlError::Graphql`].
    #[must_use]
    pub fn graphql_errors(&self) -> Option<&[GraphqlErrorDetail]> {
        match self {
            Self::Graphql { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Returns the partial data attached to a [`GraphqlError::Graphql`].
    #[must_use]
    pub const fn partial_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Graphql { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}
