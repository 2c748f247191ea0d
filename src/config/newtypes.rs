//! Validated newtype wrappers for configuration values.
//!
//! Every wrapper validates on construction. Secret-bearing wrappers mask their
//! value in `Debug` output so they can be logged alongside the configuration.

use crate::error::ConfigError;
use std::fmt;

/// A validated Shopify API key (the user half of private app basic auth).
///
/// # Example
///
/// ```rust
/// use shopify_graphql::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated API secret key, used as the password of private app basic auth.
///
/// ```rust
/// use shopify_graphql::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated Admin API access token, sent as `X-Shopify-Access-Token`.
///
/// ```rust
/// use shopify_graphql::AccessToken;
///
/// let token = AccessToken::new("shpat_123").unwrap();
/// assert_eq!(format!("{:?}", token), "AccessToken(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new validated access token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAccessToken`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ConfigError::EmptyAccessToken);
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// A validated Shopify shop domain, normalized to `shop.myshopify.com`.
///
/// # Accepted Formats
///
/// - `shop-name` - normalized to `shop-name.myshopify.com`
/// - `shop-name.myshopify.com` - used as-is
///
/// # Example
///
/// ```rust
/// use shopify_graphql::ShopDomain;
///
/// let domain = ShopDomain::new("my-store").unwrap();
/// assert_eq!(domain.as_ref(), "my-store.myshopify.com");
/// assert_eq!(domain.shop_name(), "my-store");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopDomain {
    full_domain: String,
    shop_name_end: usize,
}

impl ShopDomain {
    const SUFFIX: &'static str = ".myshopify.com";

    /// Creates a new validated shop domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is invalid.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_lowercase();

        let stripped = domain.strip_suffix(Self::SUFFIX).map(str::to_string);
        let (shop_name, full_domain) = match stripped {
            Some(shop_name) => (shop_name, domain.clone()),
            None if domain.contains('.') => {
                return Err(ConfigError::InvalidShopDomain { domain });
            }
            None => (domain.clone(), format!("{domain}{}", Self::SUFFIX)),
        };

        if !Self::is_valid_shop_name(&shop_name) {
            return Err(ConfigError::InvalidShopDomain { domain });
        }

        Ok(Self {
            shop_name_end: shop_name.len(),
            full_domain,
        })
    }

    /// Returns the shop name portion of the domain.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.full_domain[..self.shop_name_end]
    }

    // Lowercase letters, digits and inner hyphens only.
    fn is_valid_shop_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('-')
            && !name.ends_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.full_domain
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_domain)
    }
}

/// A validated API host override (for proxies and local mock servers).
///
/// Only the origin (scheme, host and port) is used; any path is ignored.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::HostUrl;
///
/// let url = HostUrl::new("http://localhost:3000/ignored").unwrap();
/// assert_eq!(url.scheme(), "http");
/// assert_eq!(url.host_name(), Some("localhost"));
/// assert_eq!(url.origin(), "http://localhost:3000");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
    origin_end: usize,
}

impl HostUrl {
    /// Creates a new validated host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL has no scheme or host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        let invalid = || ConfigError::InvalidHostUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);
        if host_end == host_start {
            return Err(invalid());
        }

        let origin_end = remainder
            .find(['/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
            origin_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        let host = &self.url[self.host_start..self.host_end];
        (!host.is_empty()).then_some(host)
    }

    /// Returns `scheme://host[:port]`.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.url[..self.origin_end]
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_empty_string() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_secrets_are_masked_in_debug() {
        let secret = ApiSecretKey::new("super-secret-key").unwrap();
        assert!(!format!("{secret:?}").contains("super-secret-key"));

        let token = AccessToken::new("shpat_secret").unwrap();
        assert_eq!(format!("{token:?}"), "AccessToken(*****)");
    }

    #[test]
    fn test_access_token_rejects_empty_string() {
        assert!(matches!(
            AccessToken::new(""),
            Err(ConfigError::EmptyAccessToken)
        ));
    }

    #[test]
    fn test_shop_domain_normalizes_short_format() {
        let domain = ShopDomain::new("My-Store").unwrap();
        assert_eq!(domain.as_ref(), "my-store.myshopify.com");
        assert_eq!(domain.shop_name(), "my-store");
        assert_eq!(domain.to_string(), "my-store.myshopify.com");
    }

    #[test]
    fn test_shop_domain_rejects_invalid_domains() {
        assert!(ShopDomain::new("").is_err());
        assert!(ShopDomain::new("my store").is_err());
        assert!(ShopDomain::new("my_store").is_err());
        assert!(ShopDomain::new("-my-store").is_err());
        assert!(ShopDomain::new("my-store-").is_err());
        assert!(ShopDomain::new("my-store.otherdomain.com").is_err());
    }

    #[test]
    fn test_host_url_origin_keeps_port_and_drops_path() {
        let url = HostUrl::new("http://127.0.0.1:8080/admin").unwrap();
        assert_eq!(url.origin(), "http://127.0.0.1:8080");

        let url = HostUrl::new("https://proxy.example.com").unwrap();
        assert_eq!(url.origin(), "https://proxy.example.com");
        assert_eq!(url.host_name(), Some("proxy.example.com"));
    }

    #[test]
    fn test_host_url_rejects_invalid() {
        assert!(HostUrl::new("proxy.example.com").is_err());
        assert!(HostUrl::new("https://").is_err());
        assert!(HostUrl::new("://example.com").is_err());
    }
}
