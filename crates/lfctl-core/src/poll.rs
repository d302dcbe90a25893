// ── Bounded convergence wait ──
//
// The controller applies commands asynchronously and offers no
// notifications, so every confirmation is a poll. Check `k` (0-based) is
// issued at `k * interval` after the wait starts, and only while
// `k * interval <= timeout`. The first check goes out immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::trace;

use crate::error::CoreError;

/// Interval and upper bound of a convergence wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

/// Result of a bounded wait that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Convergence<T> {
    Reached { value: T, elapsed: Duration },
    Expired { elapsed: Duration },
}

/// Check until `check` yields `Some`, or the policy runs out.
///
/// Errors from `check` abort the wait immediately.
pub async fn wait_until<T, F, Fut>(policy: PollPolicy, mut check: F) -> Result<Convergence<T>, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, CoreError>>,
{
    let start = Instant::now();
    let mut issued: u32 = 0;
    loop {
        let found = check().await?;
        issued += 1;
        let elapsed = start.elapsed();
        if let Some(value) = found {
            trace!(checks = issued, ?elapsed, "converged");
            return Ok(Convergence::Reached { value, elapsed });
        }

        let next = (!policy.interval.is_zero())
            .then(|| policy.interval.checked_mul(issued))
            .flatten()
            .filter(|offset| *offset <= policy.timeout);
        let Some(offset) = next else {
            trace!(checks = issued, ?elapsed, "wait expired");
            return Ok(Convergence::Expired { elapsed });
        };
        sleep_until(start + offset).await;
    }
}
