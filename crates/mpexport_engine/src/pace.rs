use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Inclusive range a random pause is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl PauseRange {
    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 1000,
            max_ms: max * 1000,
        }
    }

    pub fn sample(&self) -> Duration {
        let (low, high) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPacing {
    pub after_success: PauseRange,
    pub after_failure: PauseRange,
    pub between_pages: PauseRange,
}

impl Default for BatchPacing {
    fn default() -> Self {
        Self {
            after_success: PauseRange::from_secs(2, 4),
            after_failure: PauseRange::from_secs(1, 2),
            between_pages: PauseRange::from_secs(2, 4),
        }
    }
}

impl BatchPacing {
    /// No waiting at all.
    pub fn none() -> Self {
        Self {
            after_success: PauseRange::from_secs(0, 0),
            after_failure: PauseRange::from_secs(0, 0),
            between_pages: PauseRange::from_secs(0, 0),
        }
    }
}

/// Sleeps for `delay` unless `cancel` fires first. Returns `false` when cancelled.
pub async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
