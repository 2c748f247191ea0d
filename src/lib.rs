//! # Shopify GraphQL Client
//!
//! An async client for the Shopify GraphQL Admin and Storefront APIs, with
//! first-class support for bulk data exports.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ShopifyConfig`] and [`ShopifyConfigBuilder`]
//! - Validated newtypes for credentials and domain values
//! - A GraphQL transport ([`GraphqlClient`]) that decodes `data` into your
//!   types and reports GraphQL errors, user errors and HTTP failures separately
//! - Bounded retry with linear backoff and error classification ([`retry`])
//! - Bulk operations: submit, poll, download and rebuild nested results
//!   ([`bulk`])
//! - Cursor pagination over connections ([`pagination`])
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_graphql::{AccessToken, ApiVersion, Credentials, GraphqlClient, ShopDomain, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .shop(ShopDomain::new("my-store").unwrap())
//!     .credentials(Credentials::AccessToken(AccessToken::new("shpat_123").unwrap()))
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//!
//! let client = GraphqlClient::new(&config);
//! ```
//!
//! ## Queries
//!
//! ```rust,ignore
//! use shopify_graphql::clients::graphql::Operation;
//!
//! let operation = Operation::new("query GetProduct($id: ID!) { product(id: $id) { title } }")
//!     .variable("id", "gid://shopify/Product/1");
//!
//! // One attempt
//! let data: ProductData = client.execute(&operation).await?;
//!
//! // Retried per the configured RetryPolicy
//! let data: ProductData = client.execute_with_retry(&operation).await?;
//! ```
//!
//! ## Bulk Exports
//!
//! ```rust,ignore
//! use shopify_graphql::bulk::BulkShape;
//!
//! let shape = BulkShape::new().collection("lineItems", "LineItem");
//! let orders: Vec<Order> = client
//!     .bulk()
//!     .run_bulk_query("{ orders { edges { node { id lineItems { edges { node { id } } } } } } }", &shape)
//!     .await?;
//! ```
//!
//! ## Thread Safety
//!
//! All configuration and client types are `Send + Sync`. Configuration is
//! read-only once built, so one client can serve many concurrent calls.

pub mod auth;
pub mod bulk;
pub mod clients;
pub mod config;
pub mod error;
pub mod pagination;
pub mod retry;

// Re-export public types at crate root for convenience
pub use auth::{Credentials, StorefrontToken};
pub use config::{
    AccessToken, ApiKey, ApiSecretKey, ApiVersion, HostUrl, ShopDomain, ShopifyConfig,
    ShopifyConfigBuilder,
};
pub use error::ConfigError;

pub use clients::graphql::{GraphqlClient, GraphqlError, Operation};
pub use clients::{HttpClient, HttpError, HttpResponse, HttpResponseError};

pub use bulk::{BulkClient, BulkError, BulkShape};
pub use pagination::{Page, PageRequest, Paginator};
pub use retry::{RetryError, RetryPolicy};
