//! Bulk data retrieval.
//!
//! Large exports run as asynchronous bulk operations on the remote service:
//!
//! 1. [`BulkClient::submit`] creates the operation and returns a [`BulkJob`]
//! 2. [`BulkClient::wait_for_completion`] polls it (each poll retried per the
//!    client's [`RetryPolicy`](crate::retry::RetryPolicy)) until it reaches a
//!    terminal status, the caller's deadline passes, or the caller cancels
//! 3. [`BulkClient::download`] streams the JSONL result file through a
//!    [`Reconstructor`] and decodes the nested objects
//!
//! [`BulkClient::run_bulk_query`] chains the three steps.
//!
//! # State Machine
//!
//! ```text
//! CREATED -> RUNNING -> { COMPLETED, FAILED, CANCELED, EXPIRED }
//!               \-> CANCELING -> CANCELED
//! ```
//!
//! A status the service adds later deserializes as `Unknown` and is polled
//! like `RUNNING`. A job never leaves a terminal status. A failed job is never resubmitted by
//! this module; its error code is returned in [`BulkError::JobFailed`].

mod errors;
mod orchestrator;
mod reconstruct;
mod types;

pub use errors::{BulkError, ReconstructError};
pub use orchestrator::BulkClient;
pub use reconstruct::{
    decode, reconstruct, BulkShape, Collection, FinalizePolicy, FlatRecord, Reconstructor,
    PARENT_ID_FIELD,
};
pub use types::{
    BulkErrorCode, BulkJob, BulkOperation, BulkOperationStatus, BulkOptions,
    DEFAULT_POLL_INTERVAL,
};
