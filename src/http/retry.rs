//! Response classification and retry policy
//!
//! Every response is sorted into one of three classes. The default rule is
//! shared by all streams; a stream may supply a small override table that is
//! consulted first.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Outcome class of an HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Pass the response through
    Success,
    /// Transient failure, retry with backoff
    Retriable,
    /// Client-side failure, give up immediately
    Fatal,
}

/// A single status override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRule {
    /// Status codes covered by this rule
    pub statuses: RangeInclusive<u16>,
    /// Class assigned to those codes
    pub class: ResponseClass,
}

/// Per-stream override table for response classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOverrides {
    /// Rules checked in order; first match wins
    pub rules: Vec<StatusRule>,
    /// Whether fatal errors carry the response body
    pub include_body: bool,
}

impl Default for StatusOverrides {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            include_body: true,
        }
    }
}

impl StatusOverrides {
    /// No overrides: the default rule applies unchanged
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a rule for a single status code
    #[must_use]
    pub fn status(self, status: u16, class: ResponseClass) -> Self {
        self.range(status..=status, class)
    }

    /// Add a rule for a range of status codes
    #[must_use]
    pub fn range(mut self, statuses: RangeInclusive<u16>, class: ResponseClass) -> Self {
        self.rules.push(StatusRule { statuses, class });
        self
    }

    /// Drop response bodies from fatal error messages
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.include_body = false;
        self
    }

    fn lookup(&self, status: u16) -> Option<ResponseClass> {
        self.rules
            .iter()
            .find(|rule| rule.statuses.contains(&status))
            .map(|rule| rule.class)
    }
}

/// Classify a response status
///
/// 429 and 5xx are retriable, any other 4xx is fatal, everything else passes.
pub fn classify(status: u16, overrides: &StatusOverrides) -> ResponseClass {
    if let Some(class) = overrides.lookup(status) {
        return class;
    }

    match status {
        429 | 500..=599 => ResponseClass::Retriable,
        400..=499 => ResponseClass::Fatal,
        _ => ResponseClass::Success,
    }
}

/// Bounded retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Base delay, doubled after every failed attempt
    pub factor: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            factor: Duration::from_secs(5),
            max_delay: Duration::from_secs(600),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and base delay
    pub fn new(max_attempts: u32, factor: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            factor,
            ..Self::default()
        }
    }

    /// Set the delay cap
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay after the given zero-based failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.factor.saturating_mul(2u32.saturating_pow(attempt));
        std::cmp::min(delay, self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts` have been made
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}
