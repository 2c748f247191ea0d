//! Client configuration.
//!
//! All settings a client needs are captured in one immutable [`ShopifyConfig`]
//! value, built once and passed to the client constructor. There is no global
//! state: two clients built from different configurations (different shops,
//! versions or credentials) never influence each other.
//!
//! # Overview
//!
//! - [`ShopifyConfig`] / [`ShopifyConfigBuilder`]: the configuration value
//! - [`ShopDomain`], [`ApiKey`], [`ApiSecretKey`], [`AccessToken`], [`HostUrl`]:
//!   validated newtypes
//! - [`ApiVersion`]: the API version requests are made against
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql::{AccessToken, ApiVersion, Credentials, ShopDomain, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .shop(ShopDomain::new("my-store").unwrap())
//!     .credentials(Credentials::AccessToken(AccessToken::new("shpat_123").unwrap()))
//!     .api_version(ApiVersion::V2025_01)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.graphql_path(), "/admin/api/2025-01/graphql.json");
//! ```

mod newtypes;
mod version;

pub use newtypes::{AccessToken, ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use crate::auth::Credentials;
use crate::bulk::BulkOptions;
use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Environment variable holding the private app API key.
pub const ENV_API_KEY: &str = "STORE_API_KEY";
/// Environment variable holding the private app password.
pub const ENV_PASSWORD: &str = "STORE_PASSWORD";
/// Environment variable holding the shop name or domain.
pub const ENV_STORE_NAME: &str = "STORE_NAME";

/// Configuration for one API client.
///
/// `ShopifyConfig` is `Clone`, `Send`, and `Sync`. It is read-only once built.
#[derive(Clone, Debug)]
pub struct ShopifyConfig {
    shop: ShopDomain,
    credentials: Credentials,
    api_version: ApiVersion,
    api_host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
    retry: RetryPolicy,
    bulk: BulkOptions,
}

impl ShopifyConfig {
    /// Creates a new builder for constructing a `ShopifyConfig`.
    #[must_use]
    pub fn builder() -> ShopifyConfigBuilder {
        ShopifyConfigBuilder::new()
    }

    /// Builds a basic-auth configuration from `STORE_API_KEY`,
    /// `STORE_PASSWORD` and `STORE_NAME`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if a variable is unset or empty,
    /// or the validation error of the value it holds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingEnvVar { name })
        };

        let api_key = ApiKey::new(var(ENV_API_KEY)?)?;
        let password = ApiSecretKey::new(var(ENV_PASSWORD)?)?;
        let shop = ShopDomain::new(var(ENV_STORE_NAME)?)?;

        Self::builder()
            .shop(shop)
            .credentials(Credentials::BasicAuth { api_key, password })
            .build()
    }

    /// Returns the shop domain.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// Returns the credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the API host override, if configured.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the retry policy applied to retried calls.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the bulk operation options.
    #[must_use]
    pub const fn bulk(&self) -> &BulkOptions {
        &self.bulk
    }

    /// Returns the GraphQL endpoint path implied by the credentials and version.
    #[must_use]
    pub fn graphql_path(&self) -> String {
        if self.credentials.is_storefront() {
            self.api_version.storefront_graphql_path()
        } else {
            self.api_version.admin_graphql_path()
        }
    }

    /// Returns the base URI requests are sent to.
    #[must_use]
    pub fn base_uri(&self) -> String {
        self.api_host.as_ref().map_or_else(
            || format!("https://{}", self.shop),
            |host| host.origin().to_string(),
        )
    }
}

// Verify ShopifyConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyConfig>();
};

/// Builder for [`ShopifyConfig`].
///
/// Required fields are `shop` and `credentials`.
///
/// # Defaults
///
/// - `api_version`: latest stable version
/// - `api_host`: `None` (requests go to `https://{shop}`)
/// - `user_agent_prefix`: `None`
/// - `retry`: [`RetryPolicy::default`]
/// - `bulk`: [`BulkOptions::default`]
#[derive(Debug, Default)]
pub struct ShopifyConfigBuilder {
    shop: Option<ShopDomain>,
    credentials: Option<Credentials>,
    api_version: Option<ApiVersion>,
    api_host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
    retry: Option<RetryPolicy>,
    bulk: Option<BulkOptions>,
}

impl ShopifyConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shop domain (required).
    #[must_use]
    pub fn shop(mut self, shop: ShopDomain) -> Self {
        self.shop = Some(shop);
        self
    }

    /// Sets the credentials (required).
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Routes every request to this origin instead of the shop domain.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the bulk operation options.
    #[must_use]
    pub const fn bulk(mut self, bulk: BulkOptions) -> Self {
        self.bulk = Some(bulk);
        self
    }

    /// Builds the [`ShopifyConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `shop` or
    /// `credentials` are not set.
    pub fn build(self) -> Result<ShopifyConfig, ConfigError> {
        let shop = self
            .shop
            .ok_or(ConfigError::MissingRequiredField { field: "shop" })?;
        let credentials = self
            .credentials
            .ok_or(ConfigError::MissingRequiredField {
                field: "credentials",
            })?;

        Ok(ShopifyConfig {
            shop,
            credentials,
            api_version: self.api_version.unwrap_or_default(),
            api_host: self.api_host,
            user_agent_prefix: self.user_agent_prefix,
            retry: self.retry.unwrap_or_default(),
            bulk: self.bulk.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StorefrontToken;
    use std::time::Duration;

    fn token_credentials() -> Credentials {
        Credentials::AccessToken(AccessToken::new("shpat_test").unwrap())
    }

    #[test]
    fn test_builder_requires_shop() {
        let result = ShopifyConfig::builder()
            .credentials(token_credentials())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "shop" })
        ));
    }

    #[test]
    fn test_builder_requires_credentials() {
        let result = ShopifyConfig::builder()
            .shop(ShopDomain::new("test-shop").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "credentials"
            })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ShopifyConfig::builder()
            .shop(ShopDomain::new("test-shop").unwrap())
            .credentials(token_credentials())
            .build()
            .unwrap();

        assert_eq!(config.api_version(), &ApiVersion::latest());
        assert!(config.api_host().is_none());
        assert!(config.user_agent_prefix().is_none());
        assert_eq!(config.retry(), &RetryPolicy::default());
        assert_eq!(config.bulk().poll_interval, Duration::from_secs(1));
        assert_eq!(config.base_uri(), "https://test-shop.myshopify.com");
    }

    #[test]
    fn test_storefront_credentials_select_storefront_path() {
        let config = ShopifyConfig::builder()
            .shop(ShopDomain::new("test-shop").unwrap())
            .credentials(Credentials::Storefront(
                StorefrontToken::public("pub").unwrap(),
            ))
            .api_version(ApiVersion::V2024_10)
            .build()
            .unwrap();

        assert_eq!(config.graphql_path(), "/api/2024-10/graphql.json");
    }

    #[test]
    fn test_api_host_overrides_base_uri() {
        let config = ShopifyConfig::builder()
            .shop(ShopDomain::new("test-shop").unwrap())
            .credentials(token_credentials())
            .api_host(HostUrl::new("http://127.0.0.1:9000/anything").unwrap())
            .build()
            .unwrap();

        assert_eq!(config.base_uri(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_config_debug_masks_credentials() {
        let config = ShopifyConfig::builder()
            .shop(ShopDomain::new("test-shop").unwrap())
            .credentials(token_credentials())
            .build()
            .unwrap();

        let debug = format!("{config:?}");
        assert!(debug.contains("ShopifyConfig"));
        assert!(!debug.contains("shpat_test"));
    }
}
