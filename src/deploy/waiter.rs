// ABOUTME: Bounded polling of long-running provider operations.
// ABOUTME: Stops at the first terminal state, poll error or exhausted round budget.

use std::time::Instant;

use tracing::debug;

use crate::cloud::{OperationError, OperationHandle, OperationOps, OperationState};
use crate::config::WaitPolicy;

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("{operation} failed: {message}")]
    Failed { operation: String, message: String },

    #[error("polling {operation} failed: {source}")]
    Poll {
        operation: String,
        #[source]
        source: OperationError,
    },

    #[error("{operation} still running after {rounds} polls")]
    Timeout { operation: String, rounds: u32 },
}

/// A successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Number of polls it took to see the operation done.
    pub rounds: u32,
}

/// Polls an operation once per interval until it settles.
#[derive(Debug, Clone, Copy)]
pub struct OperationWaiter {
    policy: WaitPolicy,
}

impl OperationWaiter {
    pub fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    /// Wait for `handle` to finish.
    ///
    /// Each round polls once, then sleeps whatever is left of the interval.
    /// A failed operation or a failed poll ends the wait immediately.
    pub async fn wait<O>(&self, ops: &O, handle: &OperationHandle) -> Result<Completion, WaitError>
    where
        O: OperationOps + ?Sized,
    {
        let max_rounds = self.policy.max_rounds;

        for round in 1..=max_rounds {
            let started = Instant::now();
            let state = ops
                .poll_operation(handle)
                .await
                .map_err(|source| WaitError::Poll {
                    operation: handle.to_string(),
                    source,
                })?;

            debug!(operation = %handle, round, max_rounds, state = ?state, "polled");

            match state {
                OperationState::Done => return Ok(Completion { rounds: round }),
                OperationState::Failed { message } => {
                    return Err(WaitError::Failed {
                        operation: handle.to_string(),
                        message,
                    });
                }
                OperationState::Pending | OperationState::Running => {}
            }

            if round < max_rounds {
                let remaining = self.policy.interval.saturating_sub(started.elapsed());
                tokio::time::sleep(remaining).await;
            }
        }

        Err(WaitError::Timeout {
            operation: handle.to_string(),
            rounds: max_rounds,
        })
    }
}
