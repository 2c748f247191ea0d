//! Bulk operation and reconstruction error types.

use thiserror::Error;

use crate::bulk::{BulkErrorCode, BulkOperationStatus};
use crate::clients::graphql::GraphqlError;
use crate::clients::HttpError;
use crate::retry::RetryError;

fn code_text(code: Option<&BulkErrorCode>) -> &str {
    code.map_or("none", BulkErrorCode::as_str)
}

/// A fault while rebuilding nested objects from a bulk result file.
///
/// Every variant except `Decode` names the 1-based line it occurred on.
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// A line is not a JSON object.
    #[error("line {line}: invalid JSON record: {source}")]
    InvalidJson {
        /// 1-based line number.
        line: usize,
        /// The parse error.
        source: serde_json::Error,
    },

    /// A `__parentId` that is neither a string, a number nor `null`.
    #[error("line {line}: invalid parent reference {reference}")]
    InvalidParentReference {
        /// 1-based line number.
        line: usize,
        /// The reference as it appeared in the record.
        reference: serde_json::Value,
    },

    /// A child record references a parent that has not been seen.
    ///
    /// Either the file is out of order or the shape does not match the query.
    #[error(
        "line {line}: record {} references parent {parent_id} which has not been seen",
        .id.as_deref().unwrap_or("without id")
    )]
    OrphanRecord {
        /// 1-based line number.
        line: usize,
        /// The record's own ID, if it has one.
        id: Option<String>,
        /// The missing parent.
        parent_id: String,
    },

    /// No collection of the parent's shape accepts the record.
    #[error(
        "line {line}: no collection under parent {parent_id} accepts child type {}",
        .child_type.as_deref().unwrap_or("unknown")
    )]
    UnknownCollection {
        /// 1-based line number.
        line: usize,
        /// The parent the record references.
        parent_id: String,
        /// The record's type, when it could be determined.
        child_type: Option<String>,
    },

    /// A reconstructed object does not fit the requested output type.
    #[error("failed to decode reconstructed record: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Error type for bulk operations.
#[derive(Debug, Error)]
pub enum BulkError {
    /// The job-creation mutation failed, including user errors.
    #[error("failed to submit bulk query: {0}")]
    Submit(#[source] GraphqlError),

    /// The job-creation mutation returned no operation.
    #[error("bulk query submission returned no operation id")]
    MissingOperationId,

    /// A status or cancel request failed.
    #[error(transparent)]
    Request(GraphqlError),

    /// Polling failed after the retry policy gave up.
    #[error("failed to poll bulk operation {id}: {source}")]
    Poll {
        /// The polled operation.
        id: String,
        /// The retry outcome.
        source: RetryError<GraphqlError>,
    },

    /// The operation ended without results.
    #[error(
        "bulk operation {id} finished with status {status} (error code: {})",
        code_text(.error_code.as_ref())
    )]
    JobFailed {
        /// The operation.
        id: String,
        /// Its terminal status.
        status: BulkOperationStatus,
        /// The reported error code.
        error_code: Option<BulkErrorCode>,
    },

    /// The operation completed with objects but no result location.
    #[error("Operation result URL is empty for bulk operation {id}")]
    EmptyResultUrl {
        /// The operation.
        id: String,
    },

    /// Fetching the result file failed.
    #[error("failed to download bulk result: {0}")]
    Download(#[source] HttpError),

    /// The result file could not be reconstructed.
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),

    /// The caller's deadline passed while the operation was still running.
    ///
    /// The remote operation is not canceled.
    #[error("deadline exceeded while waiting for bulk operation {id}")]
    DeadlineExceeded {
        /// The operation.
        id: String,
    },

    /// The caller cancelled the wait.
    ///
    /// The remote operation is not canceled.
    #[error("waiting for bulk operation {id}: operation cancelled")]
    Cancelled {
        /// The operation.
        id: String,
    },

    /// No bulk operation exists with this ID.
    #[error("bulk operation {id} not found")]
    NotFound {
        /// The requested ID.
        id: String,
    },

    /// A poll reported a status change out of a terminal status.
    #[error("bulk operation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The operation.
        id: String,
        /// The terminal status the job is in.
        from: BulkOperationStatus,
        /// The status reported by the poll.
        to: BulkOperationStatus,
    },
}

impl BulkError {
    /// Returns the error code of a failed operation.
    #[must_use]
    pub const fn error_code(&self) -> Option<&BulkErrorCode> {
        match self {
            Self::JobFailed { error_code, .. } => error_code.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::ShopifyErrorClassifier;

    #[test]
    fn test_job_failed_message_includes_code() {
        let error = BulkError::JobFailed {
            id: "gid://shopify/BulkOperation/7".to_string(),
            status: BulkOperationStatus::Failed,
            error_code: Some(BulkErrorCode::AccessDenied),
        };
        assert_eq!(
            error.to_string(),
            "bulk operation gid://shopify/BulkOperation/7 finished with status FAILED (error code: ACCESS_DENIED)"
        );
        assert_eq!(error.error_code(), Some(&BulkErrorCode::AccessDenied));
    }

    #[test]
    fn test_final_bulk_errors_are_classified_final() {
        let empty = BulkError::EmptyResultUrl {
            id: "gid://shopify/BulkOperation/7".to_string(),
        };
        let deadline = BulkError::DeadlineExceeded {
            id: "gid://shopify/BulkOperation/7".to_string(),
        };
        let cancelled = BulkError::Cancelled {
            id: "gid://shopify/BulkOperation/7".to_string(),
        };

        assert!(ShopifyErrorClassifier::classify(&empty).is_some());
        assert!(ShopifyErrorClassifier::classify(&deadline).is_some());
        assert!(ShopifyErrorClassifier::classify(&cancelled).is_some());
    }

    #[test]
    fn test_orphan_message() {
        let error = ReconstructError::OrphanRecord {
            line: 3,
            id: None,
            parent_id: "gid://shopify/Product/9".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "line 3: record without id references parent gid://shopify/Product/9 which has not been seen"
        );
    }
}
