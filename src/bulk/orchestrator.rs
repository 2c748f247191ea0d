//! Bulk operation client: submit, poll, cancel and download.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::bulk::reconstruct::{decode, BulkShape, Reconstructor};
use crate::bulk::{BulkError, BulkJob, BulkOperation, BulkOperationStatus};
use crate::clients::graphql::{GraphqlClient, GraphqlError, HasUserErrors, Operation, UserError};

const RUN_QUERY_MUTATION: &str = "mutation bulkOperationRunQuery($query: String!) {
  bulkOperationRunQuery(query: $query) {
    bulkOperation { id status }
    userErrors { field message }
  }
}";

const OPERATION_QUERY: &str = "query bulkOperation($id: ID!) {
  node(id: $id) {
    ... on BulkOperation {
      id status errorCode createdAt completedAt objectCount fileSize url partialDataUrl query
    }
  }
}";

const CURRENT_OPERATION_QUERY: &str = "query currentBulkOperation {
  currentBulkOperation {
    id status errorCode createdAt completedAt objectCount fileSize url partialDataUrl query
  }
}";

const CANCEL_MUTATION: &str = "mutation bulkOperationCancel($id: ID!) {
  bulkOperationCancel(id: $id) {
    bulkOperation {
      id status errorCode createdAt completedAt objectCount fileSize url partialDataUrl query
    }
    userErrors { field message }
  }
}";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmittedOperation {
    id: String,
    status: BulkOperationStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryPayload {
    bulk_operation: Option<SubmittedOperation>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryData {
    bulk_operation_run_query: RunQueryPayload,
}

impl HasUserErrors for RunQueryData {
    fn user_errors(&self) -> &[UserError] {
        &self.bulk_operation_run_query.user_errors
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelPayload {
    bulk_operation: Option<BulkOperation>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelData {
    bulk_operation_cancel: CancelPayload,
}

impl HasUserErrors for CancelData {
    fn user_errors(&self) -> &[UserError] {
        &self.bulk_operation_cancel.user_errors
    }
}

#[derive(Deserialize)]
struct NodeData {
    node: Option<BulkOperation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentData {
    current_bulk_operation: Option<BulkOperation>,
}

/// Runs bulk queries through a [`GraphqlClient`].
///
/// Each call drives its own job: concurrent calls on the same client poll
/// independently and share nothing but the client's read-only configuration.
///
/// # Example
///
/// ```rust,no_run
/// use serde::Deserialize;
/// use shopify_graphql::bulk::BulkShape;
/// use shopify_graphql::GraphqlClient;
///
/// #[derive(Deserialize)]
/// struct Product {
///     id: String,
///     variants: Vec<Variant>,
/// }
///
/// #[derive(Deserialize)]
/// struct Variant {
///     id: String,
/// }
///
/// # async fn run(client: &GraphqlClient) -> Result<(), shopify_graphql::bulk::BulkError> {
/// let query = "{ products { edges { node { id variants { edges { node { id } } } } } } }";
/// let shape = BulkShape::new().collection("variants", "ProductVariant");
///
/// let products: Vec<Product> = client.bulk().run_bulk_query(query, &shape).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BulkClient<'a> {
    graphql: &'a GraphqlClient,
}

impl<'a> BulkClient<'a> {
    /// Creates a bulk client borrowing `graphql`.
    #[must_use]
    pub const fn new(graphql: &'a GraphqlClient) -> Self {
        Self { graphql }
    }

    /// Submits `query` as a bulk operation.
    ///
    /// Submission is never retried here; a failed submission created no job.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Submit`] on transport, GraphQL or user errors, and
    /// [`BulkError::MissingOperationId`] if no operation was returned.
    pub async fn submit(&self, query: &str) -> Result<BulkJob, BulkError> {
        let operation = Operation::new(RUN_QUERY_MUTATION).variable("query", query);
        let data: RunQueryData = self
            .graphql
            .execute_mutation(&operation)
            .await
            .map_err(BulkError::Submit)?;

        let submitted = data
            .bulk_operation_run_query
            .bulk_operation
            .ok_or(BulkError::MissingOperationId)?;

        tracing::debug!(id = %submitted.id, status = %submitted.status, "Submitted bulk operation");

        let mut job = BulkJob::new(submitted.id, query);
        job.status = submitted.status;
        Ok(job)
    }

    async fn fetch(&self, id: &str) -> Result<Option<BulkOperation>, GraphqlError> {
        let operation = Operation::new(OPERATION_QUERY).variable("id", id);
        let data: NodeData = self.graphql.execute(&operation).await?;
        Ok(data.node)
    }

    /// Fetches the status of one operation (single request, no retry).
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Request`] if the request fails and
    /// [`BulkError::NotFound`] if no such operation exists.
    pub async fn poll(&self, id: &str) -> Result<BulkOperation, BulkError> {
        self.fetch(id)
            .await
            .map_err(BulkError::Request)?
            .ok_or_else(|| BulkError::NotFound { id: id.to_string() })
    }

    /// Returns the shop's most recent bulk query, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Request`] if the request fails.
    pub async fn current_bulk_operation(&self) -> Result<Option<BulkOperation>, BulkError> {
        let operation = Operation::new(CURRENT_OPERATION_QUERY);
        let data: CurrentData = self
            .graphql
            .execute(&operation)
            .await
            .map_err(BulkError::Request)?;
        Ok(data.current_bulk_operation)
    }

    /// Waits until the shop has no bulk query in flight.
    ///
    /// Only one bulk query can run per shop, so this is typically called
    /// before [`submit`](Self::submit). Returns the last observed operation.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Request`] if a status request fails and
    /// [`BulkError::Cancelled`] if `cancel` fires.
    pub async fn wait_for_current(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<BulkOperation>, BulkError> {
        loop {
            let operation = match self.current_bulk_operation().await? {
                Some(operation) if !operation.status.is_terminal() => operation,
                other => return Ok(other),
            };

            tracing::debug!(id = %operation.id, status = %operation.status, "Waiting for running bulk operation");
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(BulkError::Cancelled { id: operation.id });
                }
                () = tokio::time::sleep(self.graphql.bulk_options().poll_interval) => {}
            }
        }
    }

    /// Requests cancellation of a running operation.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Request`] on transport, GraphQL or user errors, and
    /// [`BulkError::NotFound`] if no operation was returned.
    pub async fn cancel(&self, id: &str) -> Result<BulkOperation, BulkError> {
        let operation = Operation::new(CANCEL_MUTATION).variable("id", id);
        let data: CancelData = self
            .graphql
            .execute_mutation(&operation)
            .await
            .map_err(BulkError::Request)?;

        tracing::debug!(id, "Requested bulk operation cancellation");

        data.bulk_operation_cancel
            .bulk_operation
            .ok_or_else(|| BulkError::NotFound { id: id.to_string() })
    }

    /// Polls `job` until it reaches a terminal status.
    ///
    /// The first poll is immediate; later polls are spaced by the configured
    /// poll interval. Each poll is retried per the client's retry policy.
    /// Reaching `deadline` or firing `cancel` stops waiting without canceling
    /// the remote operation. Returns the terminal poll response.
    ///
    /// # Errors
    ///
    /// - [`BulkError::Poll`] when a poll fails after retries
    /// - [`BulkError::NotFound`] when the operation disappeared
    /// - [`BulkError::DeadlineExceeded`] / [`BulkError::Cancelled`]
    pub async fn wait_for_completion(
        &self,
        job: &mut BulkJob,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
    ) -> Result<BulkOperation, BulkError> {
        let id = job.id.clone();
        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(%id, "Stopped waiting for bulk operation: cancelled");
                Err(BulkError::Cancelled { id })
            }
            () = expired => {
                tracing::warn!(%id, "Deadline exceeded, bulk operation left running");
                Err(BulkError::DeadlineExceeded { id })
            }
            result = self.poll_until_terminal(job) => result,
        }
    }

    async fn poll_until_terminal(&self, job: &mut BulkJob) -> Result<BulkOperation, BulkError> {
        let interval = self.graphql.bulk_options().poll_interval;
        loop {
            let operation = self
                .graphql
                .retry_policy()
                .run(|| self.fetch(&job.id))
                .await
                .map_err(|source| BulkError::Poll {
                    id: job.id.clone(),
                    source,
                })?
                .ok_or_else(|| BulkError::NotFound { id: job.id.clone() })?;

            let previous = job.status;
            job.apply(&operation)?;
            if job.status != previous {
                tracing::debug!(id = %job.id, from = %previous, to = %job.status, "Bulk operation status changed");
            }
            if job.status == BulkOperationStatus::Unknown {
                tracing::warn!(id = %job.id, "Unrecognized bulk operation status, still polling");
            }

            if job.is_terminal() {
                return Ok(operation);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Submits `query`, waits for it and returns the reconstructed objects.
    ///
    /// Waits up to the configured default timeout, if any.
    ///
    /// # Errors
    ///
    /// See [`run_bulk_query_until`](Self::run_bulk_query_until).
    pub async fn run_bulk_query<T: DeserializeOwned>(
        &self,
        query: &str,
        shape: &BulkShape,
    ) -> Result<Vec<T>, BulkError> {
        let deadline = self
            .graphql
            .bulk_options()
            .timeout
            .map(|timeout| Instant::now() + timeout);
        self.run_bulk_query_until(query, shape, deadline, &CancellationToken::new())
            .await
    }

    /// Submits `query`, waits for it until `deadline` or `cancel`, and returns
    /// the reconstructed objects.
    ///
    /// # Errors
    ///
    /// - [`BulkError::Submit`] / [`BulkError::MissingOperationId`]
    /// - everything [`wait_for_completion`](Self::wait_for_completion) returns
    /// - [`BulkError::JobFailed`] when the job ends failed, canceled or expired
    /// - [`BulkError::EmptyResultUrl`] when a completed job with objects has no
    ///   result location
    /// - [`BulkError::Download`] / [`BulkError::Reconstruct`]
    pub async fn run_bulk_query_until<T: DeserializeOwned>(
        &self,
        query: &str,
        shape: &BulkShape,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, BulkError> {
        let mut job = self.submit(query).await?;
        let operation = self.wait_for_completion(&mut job, deadline, cancel).await?;

        if job.status != BulkOperationStatus::Completed {
            return Err(BulkError::JobFailed {
                id: job.id,
                status: job.status,
                error_code: job.error_code,
            });
        }

        match job.url.as_deref() {
            Some(url) => self.download(url, shape).await,
            None if operation.object_count() == Some(0) => Ok(Vec::new()),
            None => Err(BulkError::EmptyResultUrl { id: job.id }),
        }
    }

    /// Streams a result file and reconstructs its objects.
    ///
    /// Lines are processed as they arrive; only unfinished objects are held.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Download`] if the file cannot be fetched and
    /// [`BulkError::Reconstruct`] for malformed content.
    pub async fn download<T: DeserializeOwned>(
        &self,
        url: &str,
        shape: &BulkShape,
    ) -> Result<Vec<T>, BulkError> {
        let mut response = self
            .graphql
            .http_client()
            .download(url)
            .await
            .map_err(BulkError::Download)?;

        let mut reconstructor = Reconstructor::new(shape);
        let mut output = Vec::new();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|error| BulkError::Download(error.into()))?
        {
            buffer.extend_from_slice(&chunk);
            push_complete_lines(&mut buffer, &mut reconstructor, &mut output)?;
        }
        if !buffer.is_empty() {
            for value in reconstructor.push_line(&buffer)? {
                output.push(decode(value)?);
            }
        }
        for value in reconstructor.finish()? {
            output.push(decode(value)?);
        }

        tracing::debug!(url, objects = output.len(), "Downloaded bulk result");
        Ok(output)
    }
}

/// Feeds every complete line of `buffer` to `reconstructor`, leaving a trailing
/// partial line in place.
fn push_complete_lines<T: DeserializeOwned>(
    buffer: &mut Vec<u8>,
    reconstructor: &mut Reconstructor<'_>,
    output: &mut Vec<T>,
) -> Result<(), BulkError> {
    let mut start = 0;
    while let Some(offset) = buffer[start..].iter().position(|byte| *byte == b'\n') {
        let end = start + offset;
        for value in reconstructor.push_line(&buffer[start..end])? {
            output.push(decode(value)?);
        }
        start = end + 1;
    }
    buffer.drain(..start);
    Ok(())
}
