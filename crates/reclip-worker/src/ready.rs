//! Bounded polling for resources that become ready on their own schedule.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Observation from a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    Pending,
    Ready,
    Failed(String),
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    Ready,
    /// `max_wait` elapsed while the resource was still pending.
    TimedOut,
    /// The resource reported a terminal failure.
    Failed(String),
}

/// Probe every `poll_interval` until the resource is ready, fails, or
/// `max_wait` elapses.
///
/// The first probe runs immediately. Probe errors are returned as-is.
pub async fn poll_until_ready<F, Fut, E>(
    poll_interval: Duration,
    max_wait: Duration,
    mut probe: F,
) -> Result<ReadyOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ProbeState, E>>,
{
    let deadline = Instant::now() + max_wait;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match probe().await? {
            ProbeState::Ready => return Ok(ReadyOutcome::Ready),
            ProbeState::Failed(reason) => return Ok(ReadyOutcome::Failed(reason)),
            ProbeState::Pending => {}
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(attempts, "Resource still pending at deadline");
            return Ok(ReadyOutcome::TimedOut);
        }

        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}
