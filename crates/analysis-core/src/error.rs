use thiserror::Error;

/// Failure taxonomy for data acquisition.
///
/// Every acquisition path collapses into one of these three outcomes; nothing
/// below the orchestrator ever panics or leaks a transport error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network failure, timeout or non-2xx response.
    #[error("transient source failure: {0}")]
    Transient(String),

    /// The source answered but produced no usable rows or fields.
    #[error("source returned no usable data")]
    EmptyResult,

    /// An expected anchor or table is missing from fetched markup.
    #[error("expected markup anchor missing: {0}")]
    MalformedMarkup(String),
}

impl SourceError {
    /// Whether retrying the same source can plausibly succeed.
    ///
    /// A missing anchor means the page structure changed, so only transport
    /// failures and empty results are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::EmptyResult)
    }
}

/// Row-level validation failures for session data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bar high must be >= low")]
    InvalidBarRange,

    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,
}
