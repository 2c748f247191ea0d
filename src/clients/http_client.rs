//! HTTP client for the GraphQL endpoint and bulk result files.

use std::collections::HashMap;

use crate::clients::errors::{HttpError, HttpResponseError};
use crate::clients::http_response::HttpResponse;
use crate::config::ShopifyConfig;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Authenticated HTTP client bound to one shop's GraphQL endpoint.
///
/// The client handles:
/// - Endpoint URL construction from the shop domain or `api_host`
/// - Default headers (User-Agent, Accept, credential header)
/// - Deprecation header logging
///
/// It performs exactly one HTTP exchange per call. Retries are layered on top
/// by [`RetryPolicy`](crate::retry::RetryPolicy).
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::{AccessToken, Credentials, ShopDomain, ShopifyConfig};
/// use shopify_graphql::clients::HttpClient;
///
/// let config = ShopifyConfig::builder()
///     .shop(ShopDomain::new("my-store").unwrap())
///     .credentials(Credentials::AccessToken(AccessToken::new("shpat_x").unwrap()))
///     .build()
///     .unwrap();
///
/// let client = HttpClient::new(&config);
/// assert!(client.endpoint().starts_with("https://my-store.myshopify.com/admin/api/"));
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
    default_headers: HashMap<String, String>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client for the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS initialization failure).
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let endpoint = format!("{}{}", config.base_uri(), config.graphql_path());

        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}Shopify GraphQL Library v{SDK_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        // Proxied requests still name the shop they are for.
        if config.api_host().is_some() {
            default_headers.insert("Host".to_string(), config.shop().as_ref().to_string());
        }

        let (name, value) = config.credentials().header();
        default_headers.insert(name.to_string(), value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint,
            default_headers,
        }
    }

    /// Returns the full GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Posts `body`, serialized as JSON, to the GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Network error occurs (`Network`)
    /// - Non-2xx response received (`Response`, carrying the raw body)
    /// - A 2xx body is not valid JSON (`InvalidBody`)
    pub async fn post_json<B>(&self, body: &B) -> Result<HttpResponse, HttpError>
    where
        B: serde::Serialize + ?Sized,
    {
        let mut req_builder = self.client.post(&self.endpoint).json(body);
        for (key, value) in &self.default_headers {
            req_builder = req_builder.header(key, value);
        }

        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await?;

        if let Some(reason) = headers
            .get("x-shopify-api-deprecated-reason")
            .and_then(|values| values.first())
        {
            tracing::warn!(
                "Deprecated request to Shopify API at {}, received reason: {}",
                self.endpoint,
                reason
            );
        }

        if !(200..=299).contains(&code) {
            return Err(HttpError::Response(HttpResponseError {
                code,
                message: body_text,
                error_reference: headers
                    .get("x-request-id")
                    .and_then(|values| values.first())
                    .cloned(),
            }));
        }

        let body = serde_json::from_str(&body_text)
            .map_err(|source| HttpError::InvalidBody { code, source })?;

        Ok(HttpResponse::new(code, headers, body))
    }

    /// Fetches a bulk result file.
    ///
    /// Result files live on a signed storage URL, so no credential headers
    /// are sent. The returned response is known to be 2xx; the caller
    /// streams its body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] on transport failure or
    /// [`HttpError::Response`] for a non-2xx status.
    pub async fn download(&self, url: &str) -> Result<reqwest::Response, HttpError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let code = status.as_u16();
        let message = res.text().await.unwrap_or_default();
        Err(HttpError::Response(HttpResponseError {
            code,
            message,
            error_reference: None,
        }))
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}
