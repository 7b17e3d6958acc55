//! Exponential-backoff bookkeeping for catalog fetches.
//!
//! The delay after the n-th consecutive failure is
//! `base_delay * 2^(n-1)`. Once `max_attempts` retries have been
//! scheduled, the next failure is terminal until the state is reset.

use std::time::Duration;

/// Tunable parameters for the backoff strategy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Number of retries scheduled before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay for retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// What to do after a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`; this is retry number `attempt`.
    Retry { attempt: u32, delay: Duration },
    /// The attempt budget is spent.
    Exhausted { attempts: u32 },
}

/// Consecutive-failure counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct RetryState {
    attempt: u32,
}

impl RetryState {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure and decide whether another retry is allowed.
    pub fn on_failure(&mut self, policy: &RetryPolicy) -> RetryDecision {
        if self.attempt >= policy.max_attempts {
            return RetryDecision::Exhausted {
                attempts: self.attempt,
            };
        }
        self.attempt += 1;
        RetryDecision::Retry {
            attempt: self.attempt,
            delay: policy.delay_for(self.attempt),
        }
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(5), Duration::from_secs(80));
    }

    #[test]
    fn full_backoff_sequence_then_exhausted() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(5),
            max_attempts: 5,
        };
        let mut state = RetryState::default();
        let expected = [5, 10, 20, 40, 80];

        for (i, &secs) in expected.iter().enumerate() {
            assert_eq!(
                state.on_failure(&policy),
                RetryDecision::Retry {
                    attempt: i as u32 + 1,
                    delay: Duration::from_secs(secs),
                }
            );
        }

        assert_eq!(
            state.on_failure(&policy),
            RetryDecision::Exhausted { attempts: 5 }
        );
        // Stays exhausted.
        assert_eq!(
            state.on_failure(&policy),
            RetryDecision::Exhausted { attempts: 5 }
        );
    }

    #[test]
    fn reset_restarts_sequence() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::default();
        state.on_failure(&policy);
        state.on_failure(&policy);
        state.reset();
        assert_eq!(state.attempt(), 0);
        assert_eq!(
            state.on_failure(&policy),
            RetryDecision::Retry {
                attempt: 1,
                delay: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn zero_attempts_exhausts_immediately() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(1),
            max_attempts: 0,
        };
        let mut state = RetryState::default();
        assert_eq!(
            state.on_failure(&policy),
            RetryDecision::Exhausted { attempts: 0 }
        );
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_for(200) >= policy.delay_for(31));
    }
}
