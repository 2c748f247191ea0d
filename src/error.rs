//! Configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` so that an
//! invalid client can never be built. Errors raised while talking to the API
//! live next to the layer that produces them:
//!
//! - [`HttpError`](crate::clients::HttpError) for the wire
//! - [`GraphqlError`](crate::clients::graphql::GraphqlError) for the transport
//! - [`RetryError`](crate::retry::RetryError) for exhausted retries
//! - [`BulkError`](crate::bulk::BulkError) for bulk operations
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql::{AccessToken, ConfigError};
//!
//! let result = AccessToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyAccessToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Shopify API key.")]
    EmptyApiKey,

    /// API secret key (private app password) cannot be empty.
    #[error("API secret key cannot be empty. Please provide a valid Shopify API secret key.")]
    EmptyApiSecretKey,

    /// Access token cannot be empty.
    #[error("Access token cannot be empty. Please provide a valid Shopify access token.")]
    EmptyAccessToken,

    /// Storefront token cannot be empty.
    #[error("Storefront token cannot be empty. Please provide a valid storefront access token.")]
    EmptyStorefrontToken,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2024-01') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A required environment variable is missing or empty.
    #[error("Environment variable '{name}' is not set.")]
    MissingEnvVar {
        /// The name of the variable.
        name: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://proxy.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },
}
