//! Bulk operation data types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::bulk::BulkError;

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Status of a bulk operation, in the remote service's vocabulary.
///
/// `Created` and `Running` (and the transitional `Canceling`) are in flight,
/// as is `Unknown`, which stands for any status added to the service later.
/// The rest are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkOperationStatus {
    /// Accepted but not started.
    Created,
    /// Running.
    Running,
    /// A cancellation was requested and is in progress.
    Canceling,
    /// Finished; results are available.
    Completed,
    /// Canceled before completion.
    Canceled,
    /// Failed; see the error code.
    Failed,
    /// The results expired and are no longer downloadable.
    Expired,
    /// A status this crate does not know; treated as still in flight.
    #[serde(other)]
    Unknown,
}

impl BulkOperationStatus {
    /// Returns `true` once no further status change can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Failed | Self::Expired
        )
    }

    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Canceling => "CANCELING",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BulkOperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error code reported by a failed bulk operation.
///
/// Codes this crate does not know are kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum BulkErrorCode {
    /// The credentials lack access to the queried data.
    AccessDenied,
    /// The remote service failed internally.
    InternalServerError,
    /// The operation ran too long.
    Timeout,
    /// Any other code.
    Other(String),
}

impl BulkErrorCode {
    /// Returns the wire name of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AccessDenied => "ACCESS_DENIED",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for BulkErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "ACCESS_DENIED" => Self::AccessDenied,
            "INTERNAL_SERVER_ERROR" => Self::InternalServerError,
            "TIMEOUT" => Self::Timeout,
            _ => Self::Other(code),
        }
    }
}

impl fmt::Display for BulkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bulk operation as reported by the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    /// Global ID of the operation.
    pub id: String,
    /// Current status.
    pub status: BulkOperationStatus,
    /// Failure code, set only when the operation failed.
    pub error_code: Option<BulkErrorCode>,
    /// When the operation was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the operation reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of objects written so far (a decimal string on the wire).
    pub object_count: Option<String>,
    /// Size of the result file in bytes (a decimal string on the wire).
    pub file_size: Option<String>,
    /// Result file location, set once completed.
    pub url: Option<String>,
    /// Location of partial results of a failed operation.
    pub partial_data_url: Option<String>,
    /// The submitted query.
    pub query: Option<String>,
}

impl BulkOperation {
    /// Returns the object count as a number.
    #[must_use]
    pub fn object_count(&self) -> Option<u64> {
        self.object_count.as_deref().and_then(|count| count.parse().ok())
    }

    /// Returns the result location, treating an empty string as absent.
    #[must_use]
    pub fn result_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// One asynchronous export, tracked from submission to a terminal status.
///
/// A job only changes through [`apply`](Self::apply) with a poll response and
/// never leaves a terminal status. Retrying an export means submitting a new
/// job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkJob {
    /// Global ID assigned on submission.
    pub id: String,
    /// The submitted query.
    pub query: String,
    /// Last observed status.
    pub status: BulkOperationStatus,
    /// Result location, set only once `Completed`.
    pub url: Option<String>,
    /// Error code, set only on a failed or canceled outcome.
    pub error_code: Option<BulkErrorCode>,
    /// Object count reported by the last poll.
    pub object_count: Option<u64>,
}

impl BulkJob {
    /// Creates a job in the `Created` status.
    #[must_use]
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            status: BulkOperationStatus::Created,
            url: None,
            error_code: None,
            object_count: None,
        }
    }

    /// Returns `true` once the job reached a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a poll response to the job.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::InvalidTransition`] if the job is terminal and the
    /// response reports a different status.
    pub fn apply(&mut self, operation: &BulkOperation) -> Result<(), BulkError> {
        if self.status.is_terminal() && operation.status != self.status {
            return Err(BulkError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: operation.status,
            });
        }

        self.status = operation.status;
        self.object_count = operation.object_count();
        self.url = match self.status {
            BulkOperationStatus::Completed => operation.result_url().map(str::to_string),
            _ => None,
        };
        self.error_code = match self.status {
            BulkOperationStatus::Failed
            | BulkOperationStatus::Canceled
            | BulkOperationStatus::Expired => operation.error_code.clone(),
            _ => None,
        };
        Ok(())
    }
}

/// Options for bulk operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkOptions {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Default deadline for `run_bulk_query`, measured from submission.
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl BulkOptions {
    /// Returns a copy with a different poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns a copy with a default deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
