//! GraphQL transport for the Shopify Admin and Storefront APIs.
//!
//! # Overview
//!
//! - [`Operation`]: query/mutation text plus variables
//! - [`GraphqlClient`]: sends operations and decodes `data`
//! - [`GraphqlError`]: transport, GraphQL-level, user and decode errors
//! - [`HasUserErrors`] / [`UserError`]: mutation payload validation errors
//!
//! # Response Structure
//!
//! A response body may contain:
//!
//! - `data`: the query result, decoded into the caller's type
//! - `errors`: GraphQL errors (still HTTP 200); a non-empty list fails the call
//! - `extensions`: query cost information, logged at debug level

mod client;
mod errors;
mod operation;

pub use client::{GraphqlClient, HasUserErrors};
pub use errors::{ErrorLocation, GraphqlError, GraphqlErrorDetail, UserError};
pub use operation::Operation;
