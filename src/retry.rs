//! Bounded retry with linear backoff.
//!
//! [`RetryPolicy`] repeatedly invokes a fallible async operation. After each
//! failure an [`ErrorClassifier`] decides whether the error is final (returned
//! immediately, no sleep) or retryable. Retry `n` sleeps `n` backoff units, so
//! with the default one-second unit the waits are 1s, 2s, 3s, ...
//!
//! The default classifier, [`ShopifyErrorClassifier`], matches known fragments
//! of the error text (including every `source()` in the chain). Conditions such
//! as an exceeded query cost limit or an empty bulk result URL are final even
//! though a later attempt could succeed.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_graphql::retry::{RetryPolicy, RetryError};
//!
//! let policy = RetryPolicy::new(3);
//! let shop = policy.run(|| client.execute::<ShopData>(&operation)).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff unit (retry `n` sleeps `n` units).
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Categories of errors that are never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalErrorKind {
    /// The access token or API key was rejected.
    InvalidCredentials,
    /// The storefront token was rejected.
    InvalidStorefrontToken,
    /// The credentials lack the required access scope.
    PermissionDenied,
    /// The query exceeds the single query max cost limit.
    QueryCostLimitExceeded,
    /// A completed bulk operation reported no result location.
    EmptyResultLocation,
    /// The caller cancelled the call or its deadline passed.
    Cancelled,
}

/// Text fragments mapped to the final error category they indicate.
pub const FINAL_ERROR_FRAGMENTS: &[(&str, FinalErrorKind)] = &[
    (
        "Invalid API key or access token",
        FinalErrorKind::InvalidCredentials,
    ),
    ("401 Unauthorized body", FinalErrorKind::InvalidStorefrontToken),
    ("403 Forbidden", FinalErrorKind::PermissionDenied),
    ("max cost limit", FinalErrorKind::QueryCostLimitExceeded),
    (
        "Operation result URL is empty",
        FinalErrorKind::EmptyResultLocation,
    ),
    ("no Host in request URL", FinalErrorKind::EmptyResultLocation),
    ("operation cancelled", FinalErrorKind::Cancelled),
    ("deadline exceeded", FinalErrorKind::Cancelled),
];

/// Decides whether an error ends a retry loop immediately.
///
/// Closures `Fn(&E) -> bool` implement this trait, so a backend with its own
/// error vocabulary can plug in a classifier without a new type.
pub trait ErrorClassifier<E: ?Sized> {
    /// Returns `true` if `error` must not be retried.
    fn is_final(&self, error: &E) -> bool;
}

impl<E: ?Sized, F> ErrorClassifier<E> for F
where
    F: Fn(&E) -> bool,
{
    fn is_final(&self, error: &E) -> bool {
        self(error)
    }
}

/// Classifies errors by matching [`FINAL_ERROR_FRAGMENTS`] against the full
/// error chain text.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShopifyErrorClassifier;

impl ShopifyErrorClassifier {
    /// Returns the final category `text` falls into, if any.
    #[must_use]
    pub fn kind_of(text: &str) -> Option<FinalErrorKind> {
        FINAL_ERROR_FRAGMENTS
            .iter()
            .find(|(fragment, _)| text.contains(fragment))
            .map(|(_, kind)| *kind)
    }

    /// Returns the final category of `error`, if any.
    #[must_use]
    pub fn classify<E: std::error::Error + ?Sized>(error: &E) -> Option<FinalErrorKind> {
        Self::kind_of(&chain_text(error))
    }
}

impl<E: std::error::Error + ?Sized> ErrorClassifier<E> for ShopifyErrorClassifier {
    fn is_final(&self, error: &E) -> bool {
        Self::classify(error).is_some()
    }
}

fn chain_text<E: std::error::Error + ?Sized>(error: &E) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Error returned by [`RetryPolicy::run`].
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// A final error, returned as-is on the attempt that produced it.
    #[error(transparent)]
    Fatal(E),

    /// Every attempt failed with a retryable error.
    #[error("after {attempts} tries: {source}")]
    Exhausted {
        /// Total number of attempts made.
        attempts: u32,
        /// The error of the last attempt.
        source: E,
    },
}

impl<E> RetryError<E> {
    /// Returns the underlying error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Fatal(error) | Self::Exhausted { source: error, .. } => error,
        }
    }

    /// Returns the underlying error by reference.
    pub const fn inner(&self) -> &E {
        match self {
            Self::Fatal(error) | Self::Exhausted { source: error, .. } => error,
        }
    }

    /// Returns `true` if retries were exhausted.
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Bounded retry with linear backoff.
///
/// `max_retries` counts retries after the first attempt: a policy with
/// `max_retries = 3` invokes the operation at most 4 times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Sleep unit; retry `n` sleeps `n` units.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default backoff unit.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }

    /// Returns a copy with a different backoff unit.
    #[must_use]
    pub const fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Returns the sleep before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff_unit.saturating_mul(retry)
    }

    /// Runs `op` with the [`ShopifyErrorClassifier`].
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Fatal`] with the original error as soon as a
    /// final error occurs, or [`RetryError::Exhausted`] once every retry has
    /// failed.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_with(&ShopifyErrorClassifier, op).await
    }

    /// Runs `op`, consulting `classifier` after every failure.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn run_with<T, E, C, F, Fut>(
        &self,
        classifier: &C,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: fmt::Display,
        C: ErrorClassifier<E> + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retries: u32 = 0;
        loop {
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if classifier.is_final(&error) {
                return Err(RetryError::Fatal(error));
            }

            retries += 1;
            if retries > self.max_retries {
                return Err(RetryError::Exhausted {
                    attempts: retries,
                    source: error,
                });
            }

            let delay = self.delay_for(retries);
            tracing::warn!(retry = retries, ?delay, %error, "Retrying failed Shopify call");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Runs `op` with up to `max_retries` retries and the default backoff unit.
///
/// # Errors
///
/// See [`RetryPolicy::run`].
pub async fn with_retry<T, E, F, Fut>(max_retries: u32, op: F) -> Result<T, RetryError<E>>
where
    E: std::error::Error,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_retries).run(op).await
}
