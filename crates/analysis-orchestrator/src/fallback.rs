//! Parametrized fallback-chain executor.
//!
//! One resilient acquisition strategy serves every data kind: each kind
//! supplies an ordered list of source functions plus a per-source retry
//! budget, instead of re-implementing its own try/fall-through chain.

use analysis_core::SourceError;
use std::time::Duration;

/// Retry budget for one source in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub attempts: u32,
    /// Fixed blocking backoff between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            attempts: 0,
            backoff: Duration::ZERO,
        }
    }

    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }
}

/// One source in an ordered fallback chain.
pub struct ChainSource<'a, T> {
    name: &'static str,
    retry: RetryPolicy,
    fetch: Box<dyn FnMut() -> Result<T, SourceError> + 'a>,
}

impl<'a, T> ChainSource<'a, T> {
    pub fn new(
        name: &'static str,
        retry: RetryPolicy,
        fetch: impl FnMut() -> Result<T, SourceError> + 'a,
    ) -> Self {
        Self {
            name,
            retry,
            fetch: Box::new(fetch),
        }
    }
}

/// Run an ordered source chain for one data kind.
///
/// Retryable failures re-invoke the same source up to its budget, sleeping
/// the fixed backoff between attempts; non-retryable failures and exhausted
/// budgets fall through to the next source. An exhausted chain is an absent
/// result, never an error, and every branch terminates in bounded time.
pub fn run_chain<T>(kind: &str, sources: Vec<ChainSource<'_, T>>) -> Option<T> {
    for mut source in sources {
        let mut attempt: u32 = 0;
        loop {
            match (source.fetch)() {
                Ok(value) => {
                    tracing::info!(kind, source = source.name, "source succeeded");
                    return Some(value);
                }
                Err(error) if error.is_retryable() && attempt < source.retry.attempts => {
                    attempt += 1;
                    tracing::warn!(
                        kind,
                        source = source.name,
                        attempt,
                        %error,
                        "retrying source"
                    );
                    if !source.retry.backoff.is_zero() {
                        std::thread::sleep(source.retry.backoff);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        kind,
                        source = source.name,
                        %error,
                        "source exhausted, falling through"
                    );
                    break;
                }
            }
        }
    }

    tracing::warn!(kind, "all sources exhausted");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn primary_success_short_circuits() {
        let secondary_called = Cell::new(false);
        let result = run_chain(
            "test",
            vec![
                ChainSource::new("primary", RetryPolicy::none(), || Ok(1)),
                ChainSource::new("secondary", RetryPolicy::none(), || {
                    secondary_called.set(true);
                    Ok(2)
                }),
            ],
        );

        assert_eq!(result, Some(1));
        assert!(!secondary_called.get());
    }

    #[test]
    fn primary_failure_falls_through_to_secondary() {
        let result = run_chain(
            "test",
            vec![
                ChainSource::new("primary", RetryPolicy::none(), || {
                    Err::<i32, _>(SourceError::Transient("boom".into()))
                }),
                ChainSource::new("secondary", RetryPolicy::none(), || Ok(2)),
            ],
        );

        assert_eq!(result, Some(2));
    }

    #[test]
    fn exhausted_chain_is_absent() {
        let result = run_chain::<i32>(
            "test",
            vec![
                ChainSource::new("primary", RetryPolicy::none(), || {
                    Err(SourceError::Transient("boom".into()))
                }),
                ChainSource::new("secondary", RetryPolicy::none(), || {
                    Err(SourceError::EmptyResult)
                }),
            ],
        );

        assert_eq!(result, None);
    }

    #[test]
    fn retry_budget_is_honored_then_falls_through() {
        let calls = Cell::new(0u32);
        let result = run_chain(
            "test",
            vec![
                ChainSource::new("primary", RetryPolicy::new(2, Duration::ZERO), || {
                    calls.set(calls.get() + 1);
                    Err::<i32, _>(SourceError::EmptyResult)
                }),
                ChainSource::new("secondary", RetryPolicy::none(), || Ok(7)),
            ],
        );

        // One initial attempt plus two retries.
        assert_eq!(calls.get(), 3);
        assert_eq!(result, Some(7));
    }

    #[test]
    fn retry_succeeds_mid_budget() {
        let calls = Cell::new(0u32);
        let result = run_chain(
            "test",
            vec![ChainSource::new(
                "primary",
                RetryPolicy::new(2, Duration::ZERO),
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 2 {
                        Err(SourceError::Transient("flaky".into()))
                    } else {
                        Ok(42)
                    }
                },
            )],
        );

        assert_eq!(calls.get(), 2);
        assert_eq!(result, Some(42));
    }

    #[test]
    fn markup_failures_skip_the_retry_budget() {
        let calls = Cell::new(0u32);
        let result = run_chain(
            "test",
            vec![
                ChainSource::new("primary", RetryPolicy::new(5, Duration::ZERO), || {
                    calls.set(calls.get() + 1);
                    Err::<i32, _>(SourceError::MalformedMarkup("anchor gone".into()))
                }),
                ChainSource::new("secondary", RetryPolicy::none(), || Ok(9)),
            ],
        );

        // A structural failure cannot heal by retrying the same source.
        assert_eq!(calls.get(), 1);
        assert_eq!(result, Some(9));
    }
}
