//! Long-running operation model and poll policy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Error attached to a completed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// One asynchronous job as reported by the status call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

/// Where an operation stands after one status call.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Pending,
    Failed(String),
    Succeeded(Value),
}

impl Operation {
    /// An `error` on a finished operation wins over any `response`.
    pub fn outcome(self) -> OperationOutcome {
        if !self.done {
            return OperationOutcome::Pending;
        }
        if let Some(error) = self.error {
            let message = match (error.message.is_empty(), self.name.is_empty()) {
                (false, _) => error.message,
                (true, false) => format!("operation {} failed", self.name),
                (true, true) => "operation failed".to_string(),
            };
            return OperationOutcome::Failed(message);
        }
        OperationOutcome::Succeeded(self.response.unwrap_or(Value::Null))
    }
}

/// Exponential backoff schedule for status polling.
#[derive(Clone, Debug)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            initial_delay: Duration::from_millis(5000),
            max_delay: Duration::from_millis(60_000),
            backoff_multiplier: 1.5,
        }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Delay following `current`, capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        if current >= self.max_delay {
            return self.max_delay;
        }
        let multiplier = self.backoff_multiplier.max(1.0);
        Duration::from_secs_f64(current.as_secs_f64() * multiplier).min(self.max_delay)
    }

    /// The sleep before each attempt, in attempt order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let first = self.initial_delay.min(self.max_delay);
        std::iter::successors(Some(first), move |d| Some(self.next_delay(*d)))
            .take(self.max_attempts as usize)
    }

    /// Total time slept if every attempt is used.
    pub fn total_delay(&self) -> Duration {
        self.delays().sum()
    }
}
