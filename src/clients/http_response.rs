//! HTTP response types.

use std::collections::HashMap;

use serde::Deserialize;

/// Leaky bucket state reported in `extensions.cost.throttleStatus`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    /// Bucket size in cost points.
    pub maximum_available: f64,
    /// Points currently available.
    pub currently_available: f64,
    /// Points restored per second.
    pub restore_rate: f64,
}

/// Query cost information reported in `extensions.cost`.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::clients::HttpResponse;
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let response = HttpResponse::new(200, HashMap::new(), json!({
///     "data": {},
///     "extensions": { "cost": {
///         "requestedQueryCost": 12,
///         "actualQueryCost": 10,
///         "throttleStatus": {
///             "maximumAvailable": 2000.0,
///             "currentlyAvailable": 1990.0,
///             "restoreRate": 100.0
///         }
///     }}
/// }));
///
/// let cost = response.query_cost().unwrap();
/// assert_eq!(cost.actual_query_cost, Some(10.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCost {
    /// Cost estimated before execution.
    pub requested_query_cost: f64,
    /// Cost actually charged, absent when the query was not executed.
    pub actual_query_cost: Option<f64>,
    /// Bucket state after the query.
    pub throttle_status: Option<ThrottleStatus>,
}

/// An HTTP response from the API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, lowercased (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body.
    pub body: serde_json::Value,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub const fn new(
        code: u16,
        headers: HashMap<String, Vec<String>>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            code,
            headers,
            body,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `X-Shopify-API-Deprecated-Reason` header value, if present.
    #[must_use]
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.header("x-shopify-api-deprecated-reason")
    }

    /// Returns the query cost from `extensions.cost`, if reported.
    #[must_use]
    pub fn query_cost(&self) -> Option<QueryCost> {
        self.body
            .pointer("/extensions/cost")
            .and_then(|cost| QueryCost::deserialize(cost).ok())
    }
}
