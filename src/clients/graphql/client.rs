//! GraphQL transport.
//!
//! This module provides the [`GraphqlClient`] type: one POST per call, typed
//! decoding of `data`, and classification of the outcome.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use crate::bulk::{BulkClient, BulkOptions};
use crate::clients::graphql::{GraphqlError, GraphqlErrorDetail, Operation, UserError};
use crate::clients::{HttpClient, HttpResponse};
use crate::config::{ApiVersion, ShopifyConfig};
use crate::retry::{RetryError, RetryPolicy};

/// A mutation payload that reports domain-level validation errors.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use shopify_graphql::clients::graphql::{HasUserErrors, UserError};
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct ProductDeletePayload {
///     deleted_product_id: Option<String>,
///     user_errors: Vec<UserError>,
/// }
///
/// impl HasUserErrors for ProductDeletePayload {
///     fn user_errors(&self) -> &[UserError] {
///         &self.user_errors
///     }
/// }
/// ```
pub trait HasUserErrors {
    /// Returns the payload's user errors (empty on success).
    fn user_errors(&self) -> &[UserError];
}

/// GraphQL client bound to one shop, API version and credential.
///
/// Every call issues exactly one HTTP request unless it is explicitly
/// retried (`execute_with_retry`). Each call runs inside a
/// `shopify_graphql.send` tracing span carrying the operation description,
/// the target URL and the variables; the span records the call's `outcome`.
///
/// # Thread Safety
///
/// `GraphqlClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,no_run
/// use serde::Deserialize;
/// use shopify_graphql::{AccessToken, Credentials, GraphqlClient, ShopDomain, ShopifyConfig};
/// use shopify_graphql::clients::graphql::Operation;
///
/// #[derive(Deserialize)]
/// struct ShopData { shop: Shop }
/// #[derive(Deserialize)]
/// struct Shop { name: String }
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ShopifyConfig::builder()
///     .shop(ShopDomain::new("my-store")?)
///     .credentials(Credentials::AccessToken(AccessToken::new("shpat_x")?))
///     .build()?;
/// let client = GraphqlClient::new(&config);
///
/// let data: ShopData = client.execute(&Operation::new("{ shop { name } }")).await?;
/// println!("{}", data.shop.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GraphqlClient {
    http_client: HttpClient,
    api_version: ApiVersion,
    retry: RetryPolicy,
    bulk: BulkOptions,
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient {
    /// Creates a new GraphQL client from `config`.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self {
            http_client: HttpClient::new(config),
            api_version: config.api_version().clone(),
            retry: *config.retry(),
            bulk: config.bulk().clone(),
        }
    }

    /// Returns the API version being used by this client.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the retry policy used by `execute_with_retry` and bulk polling.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the bulk operation options.
    #[must_use]
    pub const fn bulk_options(&self) -> &BulkOptions {
        &self.bulk
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// Returns a bulk operation client borrowing this client.
    #[must_use]
    pub const fn bulk(&self) -> BulkClient<'_> {
        BulkClient::new(self)
    }

    /// Executes one operation and decodes its `data` into `T`.
    ///
    /// # Errors
    ///
    /// - [`GraphqlError::Http`] for network failures and non-2xx statuses
    /// - [`GraphqlError::Graphql`] when the `errors` array is non-empty, even
    ///   if partial data was returned
    /// - [`GraphqlError::MissingData`] / [`GraphqlError::Decode`] when `data`
    ///   is absent or does not fit `T`
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: &Operation,
    ) -> Result<T, GraphqlError> {
        let variables = Value::Object(operation.variables_map().clone());
        let span = tracing::info_span!(
            "shopify_graphql.send",
            description = %operation.description(),
            url = %self.http_client.endpoint(),
            variables = %variables,
            outcome = tracing::field::Empty,
        );

        let result = self.send(operation).instrument(span.clone()).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(GraphqlError::Graphql { .. }) => "graphql_errors",
            Err(GraphqlError::Http(_)) => "http_error",
            Err(_) => "decode_error",
        };
        span.record("outcome", outcome);
        result
    }

    async fn send<T: DeserializeOwned>(&self, operation: &Operation) -> Result<T, GraphqlError> {
        let response = self.http_client.post_json(operation).await?;
        if let Some(cost) = response.query_cost() {
            tracing::debug!(
                requested = cost.requested_query_cost,
                actual = ?cost.actual_query_cost,
                available = ?cost.throttle_status.map(|status| status.currently_available),
                "Query cost"
            );
        }
        decode_response(response)
    }

    /// Executes one operation, retrying per the client's [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Fatal`] for errors classified final and
    /// [`RetryError::Exhausted`] once every retry has failed.
    pub async fn execute_with_retry<T: DeserializeOwned>(
        &self,
        operation: &Operation,
    ) -> Result<T, RetryError<GraphqlError>> {
        self.retry.run(|| self.execute(operation)).await
    }

    /// Executes a mutation and fails when its payload reports user errors.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// [`GraphqlError::UserErrors`] when the payload's user errors are non-empty.
    pub async fn execute_mutation<T>(&self, operation: &Operation) -> Result<T, GraphqlError>
    where
        T: DeserializeOwned + HasUserErrors,
    {
        let payload: T = self.execute(operation).await?;
        if payload.user_errors().is_empty() {
            Ok(payload)
        } else {
            Err(GraphqlError::UserErrors(payload.user_errors().to_vec()))
        }
    }

    /// Runs many operations one after another.
    ///
    /// A failing item is logged and the batch continues; the result of every
    /// item is returned in input order.
    pub async fn execute_each<T, I>(&self, operations: I) -> Vec<Result<T, GraphqlError>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = Operation>,
    {
        let mut results = Vec::new();
        for (index, operation) in operations.into_iter().enumerate() {
            let result = self.execute(&operation).await;
            if let Err(error) = &result {
                tracing::warn!(
                    index,
                    description = %operation.description(),
                    %error,
                    "Batch item failed, continuing"
                );
            }
            results.push(result);
        }
        results
    }
}

/// Splits a 2xx GraphQL envelope into typed data or an error.
fn decode_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, GraphqlError> {
    let mut body = response.body;
    let data = body
        .get_mut("data")
        .map(Value::take)
        .filter(|data| !data.is_null());

    let errors = match body.get_mut("errors").map(Value::take) {
        Some(Value::Array(errors)) if !errors.is_empty() => Some(errors),
        _ => None,
    };

    if let Some(errors) = errors {
        let errors = errors
            .into_iter()
            .map(|error| {
                serde_json::from_value::<GraphqlErrorDetail>(error.clone())
                    .unwrap_or_else(|_| GraphqlErrorDetail::new(error.to_string()))
            })
            .collect();
        return Err(GraphqlError::Graphql { errors, data });
    }

    let data = data.ok_or(GraphqlError::MissingData)?;
    serde_json::from_value(data).map_err(GraphqlError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize)]
    struct ShopData {
        shop: Shop,
    }

    #[derive(Debug, Deserialize)]
    struct Shop {
        name: String,
    }

    fn ok(body: Value) -> HttpResponse {
        HttpResponse::new(200, HashMap::new(), body)
    }

    #[test]
    fn test_decode_data() {
        let data: ShopData = decode_response(ok(json!({"data": {"shop": {"name": "Demo"}}}))).unwrap();
        assert_eq!(data.shop.name, "Demo");
    }

    #[test]
    fn test_errors_win_over_partial_data() {
        let result: Result<ShopData, _> = decode_response(ok(json!({
            "data": {"shop": {"name": "Demo"}},
            "errors": [{"message": "Throttled", "extensions": {"code": "THROTTLED"}}]
        })));

        match result {
            Err(GraphqlError::Graphql { errors, data }) => {
                assert_eq!(errors[0].message, "Throttled");
                assert_eq!(data.unwrap()["shop"]["name"], "Demo");
            }
            other => panic!("expected GraphQL error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_errors_array_is_success() {
        let data: ShopData =
            decode_response(ok(json!({"data": {"shop": {"name": "Demo"}}, "errors": []}))).unwrap();
        assert_eq!(data.shop.name, "Demo");
    }

    #[test]
    fn test_missing_and_mismatched_data() {
        let missing: Result<ShopData, _> = decode_response(ok(json!({"data": null})));
        assert!(matches!(missing, Err(GraphqlError::MissingData)));

        let mismatched: Result<ShopData, _> = decode_response(ok(json!({"data": {"shop": 1}})));
        assert!(matches!(mismatched, Err(GraphqlError::Decode(_))));
    }

    #[test]
    fn test_unstructured_error_entry_is_kept_as_text() {
        let result: Result<ShopData, _> = decode_response(ok(json!({"errors": ["boom"]})));
        let error = result.unwrap_err();
        assert_eq!(error.to_string(), "\"boom\"");
    }
}
