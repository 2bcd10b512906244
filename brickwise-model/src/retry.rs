//! Backoff schedule for transient provider failures.

use brickwise_core::BrickError;
use std::time::Duration;

/// When and how long to wait before re-sending a failed request.
///
/// `max_attempts` counts the initial try; delays double from
/// `base_delay` and cap at `max_delay`. The client owns the loop, this
/// type only answers "is it worth another attempt, and after how long".
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// One attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Delay before retry number `retry` (0-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_delay)
    }

    /// Transient failures are provider-side overload or transport
    /// trouble. Protocol errors (4xx other than 408/429) never are: a
    /// rejected request stays rejected.
    #[must_use]
    pub fn is_transient(error: &BrickError) -> bool {
        let BrickError::Model(message) = error else { return false };

        if let Some(code) = message
            .split("HTTP ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|token| token.parse::<u16>().ok())
        {
            return matches!(code, 408 | 429) || (500..600).contains(&code);
        }

        let lower = message.to_ascii_lowercase();
        lower.contains("timed out") || lower.contains("timeout") || lower.contains("connection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(1500),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(200));
        assert_eq!(policy.delay(1), Duration::from_millis(400));
        assert_eq!(policy.delay(2), Duration::from_millis(800));
        assert_eq!(policy.delay(3), Duration::from_millis(1500));
        assert_eq!(policy.delay(10), Duration::from_millis(1500));
    }

    #[test]
    fn test_none_allows_a_single_attempt() {
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }

    #[test]
    fn test_transient_classification() {
        let transient = |msg: &str| RetryPolicy::is_transient(&BrickError::Model(msg.to_string()));

        assert!(transient("openai API error: HTTP 429 rate limited"));
        assert!(transient("openai API error: HTTP 503 unavailable"));
        assert!(transient("openai request failed: connection reset by peer"));
        assert!(transient("openai request failed: operation timed out"));
        assert!(!transient("openai API error: HTTP 400 bad request"));
        assert!(!transient("openai API error: HTTP 401 unauthorized"));
        assert!(!RetryPolicy::is_transient(&BrickError::Config("bad".into())));
    }
}
