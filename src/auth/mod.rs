//! Authentication schemes for the GraphQL transport.
//!
//! A client authenticates with exactly one scheme, chosen when its
//! [`ShopifyConfig`](crate::ShopifyConfig) is built and never switched for the
//! lifetime of the client:
//!
//! - **Access token**: `X-Shopify-Access-Token` header (custom and public apps)
//! - **Basic auth**: API key and password pair (legacy private apps)
//! - **Storefront token**: public or private storefront token header, which
//!   also routes requests to the Storefront endpoint
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql::{AccessToken, Credentials};
//!
//! let credentials = Credentials::AccessToken(AccessToken::new("shpat_123").unwrap());
//! let (name, value) = credentials.header();
//! assert_eq!(name, "X-Shopify-Access-Token");
//! assert_eq!(value, "shpat_123");
//! ```

mod credentials;

pub use credentials::{
    Credentials, StorefrontToken, ACCESS_TOKEN_HEADER_NAME, PRIVATE_STOREFRONT_HEADER_NAME,
    PUBLIC_STOREFRONT_HEADER_NAME,
};
