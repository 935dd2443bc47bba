//! The titler/categorizer collaborator contract and its retry wrapper
//! (spec.md §4.F "Titling is resilient", §6 "Remote titler/categorizer
//! contract").
//!
//! An exponential-backoff-with-cap loop around `RetryConfig` (max attempts,
//! base/max delay), with jitter added so an external LLM collaborator's
//! rate limiter sees decorrelated retries across concurrent callers.

use std::time::Duration;

use rand::Rng;

pub const FAILED_TO_TITLE: &str = "FAILED_TO_TITLE";

/// Why one `title_batch`/`categorize` call didn't produce a result.
#[derive(Debug, Clone)]
pub enum TitlerError {
    /// Rate limit, timeout, or connection reset — worth retrying.
    Transient(String),
    /// The collaborator returned a truncated response — worth retrying
    /// with a larger token budget (spec.md §4.F "doubles the max-token
    /// budget on incomplete output").
    IncompleteOutput,
    /// Not worth retrying.
    Fatal(String),
}

/// A batched text-in, title-out collaborator (spec.md §6): `(list of (text,
/// score) groups) -> list of titles`, one title per group, free to be local
/// or remote.
pub trait Titler: Send + Sync {
    /// # Errors
    ///
    /// Returns `TitlerError` on failure; the retry wrapper in this module
    /// decides which variants to retry.
    fn title_batch(&self, groups: &[Vec<(String, f64)>], max_tokens: usize) -> Result<Vec<String>, TitlerError>;
}

/// Same contract, used for spec.md §4.F step 5's category-name pass over
/// grouped titles.
pub trait Categorizer: Send + Sync {
    /// # Errors
    ///
    /// See [`Titler::title_batch`].
    fn categorize_batch(&self, groups: &[Vec<(String, f64)>], max_tokens: usize) -> Result<Vec<String>, TitlerError>;
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub initial_max_tokens: usize,
    pub max_tokens_ceiling: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(8),
            initial_max_tokens: 64,
            max_tokens_ceiling: 1024,
        }
    }
}

/// Calls `titler.title_batch` with exponential backoff + jitter on
/// transient errors, doubling the token budget on incomplete output up to
/// `max_tokens_ceiling`; on exhaustion every group in the batch gets
/// [`FAILED_TO_TITLE`] (spec.md §7 "folded into a per-item sentinel output
/// so that a single bad row does not kill the enrichment").
#[must_use]
pub fn title_with_retry(titler: &dyn Titler, groups: &[Vec<(String, f64)>], config: &RetryConfig) -> Vec<String> {
    let mut delay = config.base_delay;
    let mut max_tokens = config.initial_max_tokens;

    for attempt in 1..=config.max_attempts {
        match titler.title_batch(groups, max_tokens) {
            Ok(titles) => return titles,
            Err(TitlerError::IncompleteOutput) if max_tokens < config.max_tokens_ceiling => {
                max_tokens = (max_tokens * 2).min(config.max_tokens_ceiling);
                tracing::debug!(max_tokens, attempt, "titler truncated output, doubling token budget");
            }
            Err(TitlerError::Transient(message)) if attempt < config.max_attempts => {
                let jitter = rand::thread_rng().gen_range(0..=delay.as_millis() as u64 / 2 + 1);
                let sleep_for = delay + Duration::from_millis(jitter);
                tracing::warn!(attempt, %message, ?sleep_for, "titler call failed transiently, retrying");
                std::thread::sleep(sleep_for);
                delay = (delay * 2).min(config.max_delay);
            }
            Err(_) => break,
        }
    }

    tracing::error!(groups = groups.len(), "titler exhausted retry budget, writing sentinel");
    groups.iter().map(|_| FAILED_TO_TITLE.to_string()).collect()
}
