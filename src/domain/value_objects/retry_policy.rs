use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// When a repeatedly-failing record becomes eligible for another replay.
/// The delay doubles per recorded attempt, capped at `cap_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backoff {
    pub base_secs: u64,
    pub cap_secs: u64,
}

impl Backoff {
    pub fn delay_secs(&self, attempts: u32) -> u64 {
        if attempts == 0 {
            return 0;
        }
        let exponent = attempts.saturating_sub(1).min(32);
        self.base_secs
            .saturating_mul(1u64 << exponent)
            .min(self.cap_secs)
    }
}

/// Explicit retry scheduling for queued records: retried on every sync pass
/// unless a backoff gates them, dead-lettered once `max_attempts` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Option<Backoff>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Option<Backoff>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Whether a record with the given failure history is due for replay.
    pub fn is_due(&self, attempts: u32, last_update: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if attempts == 0 {
            return true;
        }
        match self.backoff {
            None => true,
            Some(backoff) => {
                let delay = backoff.delay_secs(attempts);
                if delay == 0 {
                    return true;
                }
                now >= last_update + Duration::seconds(delay.min(i64::MAX as u64) as i64)
            }
        }
    }

    /// Whether one more failed attempt exhausts the record's retry budget.
    pub fn exhausts_budget(&self, attempts_after_failure: u32) -> bool {
        attempts_after_failure >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: None,
        }
    }
}

impl From<&crate::shared::config::SyncConfig> for RetryPolicy {
    fn from(config: &crate::shared::config::SyncConfig) -> Self {
        let backoff = if config.backoff_base_secs == 0 {
            None
        } else {
            Some(Backoff {
                base_secs: config.backoff_base_secs,
                cap_secs: config.backoff_cap_secs.max(config.backoff_base_secs),
            })
        };
        Self::new(config.max_attempts, backoff)
    }
}
