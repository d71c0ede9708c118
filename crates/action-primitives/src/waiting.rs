//! Bounded polling on an injectable clock

use async_trait::async_trait;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Time source for every wait in the automation.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time, sleeping on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that advances only when slept on. Sleeping returns immediately.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Total simulated time slept so far.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(|p| p.into_inner()) += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Deadline and cadence of one bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollSchedule {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Probe until it yields `Some`, or until the deadline passes.
///
/// The first probe runs immediately. The last sleep is shortened so the final
/// probe happens exactly at the deadline, after which `Ok(None)` is returned.
/// Probe errors abort the wait.
pub async fn poll_until<T, E, F, Fut>(
    clock: &dyn Clock,
    schedule: PollSchedule,
    mut probe: F,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = clock.now() + schedule.timeout;
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        if let Some(found) = probe().await? {
            return Ok(Some(found));
        }

        let now = clock.now();
        if now >= deadline {
            debug!(attempts, "poll deadline reached");
            return Ok(None);
        }
        let remaining = deadline - now;
        clock.sleep(schedule.interval.min(remaining)).await;
    }
}
