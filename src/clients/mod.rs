//! HTTP and GraphQL client types.
//!
//! # Overview
//!
//! - [`HttpClient`]: authenticated POSTs to the GraphQL endpoint and plain
//!   GETs of bulk result files
//! - [`HttpResponse`]: status, headers and JSON body of a response
//! - [`HttpError`] / [`HttpResponseError`]: wire-level failures
//! - [`graphql::GraphqlClient`]: the GraphQL transport
//!
//! Neither layer retries on its own; see [`crate::retry`].

mod errors;
pub mod graphql;
mod http_client;
mod http_response;

pub use errors::{HttpError, HttpResponseError};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_response::{HttpResponse, QueryCost, ThrottleStatus};

pub use graphql::{GraphqlClient, GraphqlError};
