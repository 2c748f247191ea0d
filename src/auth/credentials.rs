//! Credential types and the header each one injects.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::{AccessToken, ApiKey, ApiSecretKey};
use crate::error::ConfigError;

/// HTTP header name for Admin API access tokens.
pub const ACCESS_TOKEN_HEADER_NAME: &str = "X-Shopify-Access-Token";

/// HTTP header name for public storefront access tokens.
pub const PUBLIC_STOREFRONT_HEADER_NAME: &str = "X-Shopify-Storefront-Access-Token";

/// HTTP header name for private storefront access tokens.
pub const PRIVATE_STOREFRONT_HEADER_NAME: &str = "Shopify-Storefront-Private-Token";

/// A Shopify Storefront API access token.
///
/// The variant selects the header the token travels in. `Debug` output masks
/// the value:
///
/// ```rust
/// use shopify_graphql::StorefrontToken;
///
/// let token = StorefrontToken::public("secret-token").unwrap();
/// assert_eq!(token.header_name(), "X-Shopify-Storefront-Access-Token");
/// assert_eq!(format!("{:?}", token), "StorefrontToken::Public(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum StorefrontToken {
    /// Public token, sent as `X-Shopify-Storefront-Access-Token`.
    Public(String),
    /// Private (server-side) token, sent as `Shopify-Storefront-Private-Token`.
    Private(String),
}

impl StorefrontToken {
    /// Creates a public storefront token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyStorefrontToken`] if the token is empty.
    pub fn public(token: impl Into<String>) -> Result<Self, ConfigError> {
        Self::non_empty(token.into()).map(Self::Public)
    }

    /// Creates a private storefront token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyStorefrontToken`] if the token is empty.
    pub fn private(token: impl Into<String>) -> Result<Self, ConfigError> {
        Self::non_empty(token.into()).map(Self::Private)
    }

    fn non_empty(token: String) -> Result<String, ConfigError> {
        if token.is_empty() {
            Err(ConfigError::EmptyStorefrontToken)
        } else {
            Ok(token)
        }
    }

    /// Returns the HTTP header name for this token type.
    #[must_use]
    pub const fn header_name(&self) -> &'static str {
        match self {
            Self::Public(_) => PUBLIC_STOREFRONT_HEADER_NAME,
            Self::Private(_) => PRIVATE_STOREFRONT_HEADER_NAME,
        }
    }

    /// Returns the token value.
    #[must_use]
    pub fn header_value(&self) -> &str {
        match self {
            Self::Public(token) | Self::Private(token) => token,
        }
    }
}

impl fmt::Debug for StorefrontToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public(_) => f.write_str("StorefrontToken::Public(*****)"),
            Self::Private(_) => f.write_str("StorefrontToken::Private(*****)"),
        }
    }
}

/// The single authentication scheme a client uses.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::{ApiKey, ApiSecretKey, Credentials};
///
/// let credentials = Credentials::BasicAuth {
///     api_key: ApiKey::new("key").unwrap(),
///     password: ApiSecretKey::new("secret").unwrap(),
/// };
/// let (name, value) = credentials.header();
/// assert_eq!(name, "Authorization");
/// assert_eq!(value, "Basic a2V5OnNlY3JldA==");
/// assert!(!credentials.is_storefront());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Admin API access token.
    AccessToken(AccessToken),
    /// Private app API key and password, sent as HTTP basic auth.
    BasicAuth {
        /// The API key (basic auth user).
        api_key: ApiKey,
        /// The API password (basic auth secret).
        password: ApiSecretKey,
    },
    /// Storefront API token.
    Storefront(StorefrontToken),
}

impl Credentials {
    /// Returns the header name and value injected into every request.
    #[must_use]
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Self::AccessToken(token) => (ACCESS_TOKEN_HEADER_NAME, token.as_ref().to_string()),
            Self::BasicAuth { api_key, password } => {
                let pair = format!("{}:{}", api_key.as_ref(), password.as_ref());
                ("Authorization", format!("Basic {}", STANDARD.encode(pair)))
            }
            Self::Storefront(token) => (token.header_name(), token.header_value().to_string()),
        }
    }

    /// Returns `true` when requests go to the Storefront endpoint.
    #[must_use]
    pub const fn is_storefront(&self) -> bool {
        matches!(self, Self::Storefront(_))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(token) => f.debug_tuple("AccessToken").field(token).finish(),
            Self::BasicAuth { api_key, password } => f
                .debug_struct("BasicAuth")
                .field("api_key", api_key)
                .field("password", password)
                .finish(),
            Self::Storefront(token) => f.debug_tuple("Storefront").field(token).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_header() {
        let credentials = Credentials::AccessToken(AccessToken::new("shpat_abc").unwrap());
        assert_eq!(
            credentials.header(),
            (ACCESS_TOKEN_HEADER_NAME, "shpat_abc".to_string())
        );
    }

    #[test]
    fn test_storefront_headers_follow_token_type() {
        let public = Credentials::Storefront(StorefrontToken::public("pub").unwrap());
        let private = Credentials::Storefront(StorefrontToken::private("priv").unwrap());

        assert_eq!(public.header().0, PUBLIC_STOREFRONT_HEADER_NAME);
        assert_eq!(private.header().0, PRIVATE_STOREFRONT_HEADER_NAME);
        assert!(public.is_storefront());
    }

    #[test]
    fn test_empty_storefront_token_is_rejected() {
        assert_eq!(
            StorefrontToken::private(""),
            Err(ConfigError::EmptyStorefrontToken)
        );
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let credentials = Credentials::BasicAuth {
            api_key: ApiKey::new("visible-key").unwrap(),
            password: ApiSecretKey::new("hidden-password").unwrap(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("visible-key"));
        assert!(!debug.contains("hidden-password"));

        let token = Credentials::Storefront(StorefrontToken::public("hidden-token").unwrap());
        assert!(!format!("{token:?}").contains("hidden-token"));
    }
}
