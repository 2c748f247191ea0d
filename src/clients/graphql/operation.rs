//! GraphQL operations (query or mutation text plus variables).

use serde::Serialize;
use serde_json::{Map, Value};

/// A GraphQL query or mutation ready to be sent.
///
/// Serializes to the `{"query": ..., "variables": ...}` request envelope;
/// `variables` is omitted when empty.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::clients::graphql::Operation;
/// use serde_json::json;
///
/// let operation = Operation::new("query GetProduct($id: ID!) { product(id: $id) { title } }")
///     .variable("id", "gid://shopify/Product/1");
///
/// assert_eq!(operation.description(), "query GetProduct");
/// assert_eq!(
///     serde_json::to_value(&operation).unwrap(),
///     json!({
///         "query": "query GetProduct($id: ID!) { product(id: $id) { title } }",
///         "variables": { "id": "gid://shopify/Product/1" }
///     })
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Operation {
    query: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    variables: Map<String, Value>,
}

impl Operation {
    /// Creates an operation without variables.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
        }
    }

    /// Adds (or replaces) one variable.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Replaces all variables.
    ///
    /// Non-object values are ignored.
    #[must_use]
    pub fn variables(mut self, variables: Value) -> Self {
        if let Value::Object(map) = variables {
            self.variables = map;
        }
        self
    }

    /// Returns the query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the variables.
    #[must_use]
    pub const fn variables_map(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// Returns a short description for tracing: the operation kind followed
    /// by the operation name, or by the first root field for anonymous
    /// operations (`{ shop { name } }` describes as `query shop`).
    #[must_use]
    pub fn description(&self) -> String {
        let text = self.query.trim_start();
        let (kind, rest) = ["query", "mutation", "subscription"]
            .iter()
            .find_map(|kind| {
                text.strip_prefix(kind)
                    .filter(|rest| rest.starts_with(|c: char| !is_name_char(c)))
                    .map(|rest| (*kind, rest))
            })
            .unwrap_or(("query", text));

        let rest = rest.trim_start();
        let name = if rest.starts_with(|c: char| c == '{' || c == '(') {
            // Anonymous: take the first selection (skipping an alias).
            let body = rest.trim_start_matches(|c: char| c != '{');
            let body = body.trim_start_matches('{').trim_start();
            let first = leading_name(body);
            let after = body[first.len()..].trim_start();
            after
                .strip_prefix(':')
                .map_or(first, |aliased| leading_name(aliased.trim_start()))
        } else {
            leading_name(rest)
        };

        if name.is_empty() {
            kind.to_string()
        } else {
            format!("{kind} {name}")
        }
    }
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn leading_name(text: &str) -> &str {
    let end = text.find(|c: char| !is_name_char(c)).unwrap_or(text.len());
    &text[..end]
}
