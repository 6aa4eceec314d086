// ABOUTME: Polling budget for long-running provider operations.
// ABOUTME: A fixed interval times a fixed number of rounds.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WaitPolicy {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub max_rounds: u32,
}

impl WaitPolicy {
    /// Budget for load balancer resources: 40 rounds of 3 seconds.
    pub fn operations() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_rounds: 40,
        }
    }

    /// Budget for image builds and service rollouts: 240 rounds of 5 seconds.
    pub fn builds() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_rounds: 240,
        }
    }

    /// Longest time a wait under this policy can take.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_rounds
    }
}
