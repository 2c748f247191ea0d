//! Cursor pagination over GraphQL connections.
//!
//! A [`Paginator`] runs one list query page by page. The query declares the
//! standard connection arguments and passes them through:
//!
//! ```graphql
//! query orders($first: Int, $after: String, $last: Int, $before: String) {
//!   orders(first: $first, after: $after, last: $last, before: $before) {
//!     edges { cursor node { id name } }
//!     pageInfo { hasNextPage hasPreviousPage }
//!   }
//! }
//! ```
//!
//! Forward requests set only `first`/`after`, backward requests only
//! `last`/`before`.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use shopify_graphql::pagination::{PageRequest, Paginator};
//! use shopify_graphql::GraphqlClient;
//!
//! #[derive(Deserialize)]
//! struct Order { id: String }
//!
//! # async fn run(client: &GraphqlClient, query: &str) -> Result<(), shopify_graphql::GraphqlError> {
//! let paginator = Paginator::new(client, query, "/orders");
//!
//! let page = paginator.list_after::<Order>(None, 50).await?;
//! if page.has_more {
//!     let next = paginator.list_after::<Order>(page.next_cursor.as_deref(), 50).await?;
//! }
//!
//! let all: Vec<Order> = paginator.collect_all(PageRequest::forward(250)).await?;
//! # Ok(())
//! # }
//! ```

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::clients::graphql::{GraphqlClient, GraphqlError, Operation};
use crate::retry::RetryError;

/// Direction of travel through a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageDirection {
    /// `first`/`after`; continues from the last edge while `hasNextPage`.
    #[default]
    Forward,
    /// `last`/`before`; continues from the first edge while `hasPreviousPage`.
    Backward,
}

/// Arguments for one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Direction of travel.
    pub direction: PageDirection,
    /// Maximum number of edges.
    pub page_size: u32,
    /// Cursor to continue from; `None` starts at the beginning (or end).
    pub cursor: Option<String>,
}

impl PageRequest {
    /// A forward request from the start.
    #[must_use]
    pub const fn forward(page_size: u32) -> Self {
        Self {
            direction: PageDirection::Forward,
            page_size,
            cursor: None,
        }
    }

    /// A backward request from the end.
    #[must_use]
    pub const fn backward(page_size: u32) -> Self {
        Self {
            direction: PageDirection::Backward,
            page_size,
            cursor: None,
        }
    }

    /// Returns a copy continuing from `cursor`.
    #[must_use]
    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    fn apply(&self, variables: &mut Map<String, Value>) {
        let (size, position) = match self.direction {
            PageDirection::Forward => ("first", "after"),
            PageDirection::Backward => ("last", "before"),
        };
        for name in ["first", "after", "last", "before"] {
            variables.remove(name);
        }
        variables.insert(size.to_string(), Value::from(self.page_size));
        if let Some(cursor) = &self.cursor {
            variables.insert(position.to_string(), Value::from(cursor.as_str()));
        }
    }
}

/// `pageInfo` of a connection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// More edges exist after this page.
    #[serde(default)]
    pub has_next_page: bool,
    /// More edges exist before this page.
    #[serde(default)]
    pub has_previous_page: bool,
}

/// One edge of a connection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Edge<T> {
    /// The item.
    pub node: T,
    /// Opaque position of the item.
    pub cursor: String,
}

/// A GraphQL connection (`edges` + `pageInfo`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    /// Edges in service order.
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
    /// Page information.
    #[serde(default)]
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    /// Converts the connection into a page for `direction`.
    #[must_use]
    pub fn into_page(self, direction: PageDirection) -> Page<T> {
        let (next_cursor, has_more) = match direction {
            PageDirection::Forward => (
                self.edges.last().map(|edge| edge.cursor.clone()),
                self.page_info.has_next_page,
            ),
            PageDirection::Backward => (
                self.edges.first().map(|edge| edge.cursor.clone()),
                self.page_info.has_previous_page,
            ),
        };
        Page {
            nodes: self.edges.into_iter().map(|edge| edge.node).collect(),
            next_cursor,
            has_more,
        }
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in service order.
    pub nodes: Vec<T>,
    /// Cursor to pass to the next request in the same direction.
    pub next_cursor: Option<String>,
    /// The service reports more items in this direction.
    pub has_more: bool,
}

/// Runs a list query page by page.
///
/// Each page is one request. Call [`with_retry`](Self::with_retry) to run
/// every page request through the client's
/// [`RetryPolicy`](crate::retry::RetryPolicy). Shares nothing with bulk
/// operations.
#[derive(Clone, Debug)]
pub struct Paginator<'a> {
    client: &'a GraphqlClient,
    query: String,
    connection_path: String,
    variables: Map<String, Value>,
    retry: bool,
}

impl<'a> Paginator<'a> {
    /// Creates a paginator.
    ///
    /// `connection_path` is a JSON pointer into `data` locating the
    /// connection, for example `/orders` or `/collection/products`.
    #[must_use]
    pub fn new(
        client: &'a GraphqlClient,
        query: impl Into<String>,
        connection_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            query: query.into(),
            connection_path: connection_path.into(),
            variables: Map::new(),
            retry: false,
        }
    }

    /// Adds a variable sent with every page (for example a search `query`).
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Retries each page request per the client's retry policy.
    ///
    /// A page that still fails returns the last error.
    #[must_use]
    pub const fn with_retry(mut self) -> Self {
        self.retry = true;
        self
    }

    /// Fetches one page.
    ///
    /// # Errors
    ///
    /// Returns the transport error, [`GraphqlError::MissingData`] if the
    /// connection path is absent, or [`GraphqlError::Decode`] if the connection
    /// does not fit `T`.
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        request: &PageRequest,
    ) -> Result<Page<T>, GraphqlError> {
        let mut variables = self.variables.clone();
        request.apply(&mut variables);
        let operation = Operation::new(self.query.as_str()).variables(Value::Object(variables));

        let mut data: Value = if self.retry {
            self.client
                .execute_with_retry(&operation)
                .await
                .map_err(RetryError::into_inner)?
        } else {
            self.client.execute(&operation).await?
        };
        let connection = data
            .pointer_mut(&self.connection_path)
            .map(Value::take)
            .filter(|value| !value.is_null())
            .ok_or(GraphqlError::MissingData)?;

        let connection: Connection<T> =
            serde_json::from_value(connection).map_err(GraphqlError::Decode)?;
        Ok(connection.into_page(request.direction))
    }

    /// Fetches the page after `cursor` (from the start when `None`).
    ///
    /// # Errors
    ///
    /// See [`list_page`](Self::list_page).
    pub async fn list_after<T: DeserializeOwned>(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<Page<T>, GraphqlError> {
        let mut request = PageRequest::forward(page_size);
        request.cursor = cursor.map(str::to_string);
        self.list_page(&request).await
    }

    /// Fetches the page before `cursor` (from the end when `None`).
    ///
    /// # Errors
    ///
    /// See [`list_page`](Self::list_page).
    pub async fn list_before<T: DeserializeOwned>(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<Page<T>, GraphqlError> {
        let mut request = PageRequest::backward(page_size);
        request.cursor = cursor.map(str::to_string);
        self.list_page(&request).await
    }

    /// Walks every page starting at `request` and concatenates the items in
    /// fetch order.
    ///
    /// Stops when the service reports no further page or a page has no edges.
    ///
    /// # Errors
    ///
    /// Returns the first page error; items fetched so far are discarded.
    pub async fn collect_all<T: DeserializeOwned>(
        &self,
        mut request: PageRequest,
    ) -> Result<Vec<T>, GraphqlError> {
        let mut items = Vec::new();
        let mut pages = 0_usize;
        loop {
            let page = self.list_page::<T>(&request).await?;
            pages += 1;
            if page.nodes.is_empty() {
                break;
            }
            items.extend(page.nodes);

            match page.next_cursor {
                Some(cursor) if page.has_more => request.cursor = Some(cursor),
                _ => break,
            }
        }
        tracing::debug!(pages, items = items.len(), "Collected all pages");
        Ok(items)
    }
}
