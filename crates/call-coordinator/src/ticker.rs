//! Elapsed call time
//!
//! The ticker counts nominal periods rather than measuring wall-clock time:
//! each tick adds one to the count, so a late delivery never skips or
//! repeats a value and no drift correction is needed.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::trace;

/// Periodic elapsed-time counter for a connected call
#[derive(Debug, Clone, Copy)]
pub struct ElapsedTicker {
    period: Duration,
}

impl ElapsedTicker {
    /// Create a ticker; a zero period is bumped to one millisecond
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the ticking task
    ///
    /// The caller is assumed to have published count `0` already; `on_tick`
    /// then receives `1, 2, 3, ...`, one period apart. Returning `false` from
    /// `on_tick` ends the task. Aborting the returned handle stops it as well.
    pub fn spawn<F>(&self, mut on_tick: F) -> JoinHandle<()>
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        let period = self.period;
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            let mut elapsed: u64 = 0;
            loop {
                interval.tick().await;
                elapsed += 1;
                trace!("Elapsed tick {}", elapsed);
                if !on_tick(elapsed) {
                    break;
                }
            }
        })
    }
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Render elapsed seconds as zero-padded `mm:ss`
///
/// Minutes are not wrapped into hours; a three hour call shows `180:00`.
pub fn format_elapsed(elapsed_secs: u64) -> String {
    format!("{:02}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}
