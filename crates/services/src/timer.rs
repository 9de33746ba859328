//! Real-time driver for [`exam_core::timer::Countdown`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use exam_core::timer::{Countdown, Start, Tick};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::error::SessionError;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One-second countdown running on the tokio runtime.
///
/// `on_tick` receives every new remaining value down to and including 0, then
/// `on_expire` runs once. `stop`, a restart, or dropping the service cancels the
/// running countdown; no callback of a cancelled countdown fires afterwards.
pub struct TimerService {
    period: Duration,
    task: Option<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService {
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            task: None,
            cancelled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Begin counting down from `duration_secs`, replacing any running countdown.
    ///
    /// A zero or negative duration calls `on_expire` synchronously and never ticks.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoRuntime` when called outside a tokio runtime.
    pub fn start<T, E>(
        &mut self,
        duration_secs: i64,
        mut on_tick: T,
        on_expire: E,
    ) -> Result<(), SessionError>
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        self.stop();

        let mut countdown = Countdown::new();
        if countdown.start(duration_secs) == Start::ExpiredImmediately {
            tracing::debug!(duration_secs, "countdown expired on start");
            on_expire();
            return Ok(());
        }

        let handle = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let cancelled = Arc::new(AtomicBool::new(false));
        self.cancelled = Arc::clone(&cancelled);
        let period = self.period;
        let mut on_expire = Some(on_expire);

        self.task = Some(handle.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if cancelled.load(Ordering::Acquire) {
                    break;
                }
                match countdown.tick() {
                    Some(Tick::Running(remaining)) => on_tick(remaining),
                    Some(Tick::Expired) => {
                        on_tick(0);
                        if cancelled.load(Ordering::Acquire) {
                            break;
                        }
                        if let Some(expire) = on_expire.take() {
                            expire();
                        }
                        break;
                    }
                    None => break,
                }
            }
        }));
        tracing::debug!(duration_secs, "countdown started");
        Ok(())
    }

    /// Cancel the running countdown, if any. Idempotent.
    pub fn stop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire)
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.stop();
    }
}
