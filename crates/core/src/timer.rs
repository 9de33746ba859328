//! Countdown state behind the exam timer.
//!
//! This is the clock-free half of the timer: the services layer calls [`Countdown::tick`]
//! once per elapsed second and forwards the outcome to its callbacks.

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One second elapsed; the new remaining value.
    Running(u32),
    /// The last second elapsed. Reported once, together with a final remaining value of 0.
    Expired,
}

/// Result of starting the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    Running(u32),
    /// The duration was zero or negative; the countdown expired without ticking.
    ExpiredImmediately,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Running,
    Expired,
    Stopped,
}

/// Seconds-remaining counter that expires exactly once.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    remaining: u32,
    phase: Phase,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to `duration_secs` and begin running. Allowed again after stop or expiry.
    pub fn start(&mut self, duration_secs: i64) -> Start {
        if duration_secs <= 0 {
            self.remaining = 0;
            self.phase = Phase::Expired;
            return Start::ExpiredImmediately;
        }
        self.remaining = u32::try_from(duration_secs).unwrap_or(u32::MAX);
        self.phase = Phase::Running;
        Start::Running(self.remaining)
    }

    /// Advance by one second. Returns `None` once stopped or expired.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.phase != Phase::Running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = Phase::Expired;
            Some(Tick::Expired)
        } else {
            Some(Tick::Running(self.remaining))
        }
    }

    /// Freeze the countdown; further ticks are ignored.
    pub fn stop(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Stopped;
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.phase == Phase::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_zero_after_duration_ticks_and_expires_once() {
        for duration in 1..=5_i64 {
            let mut countdown = Countdown::new();
            assert_eq!(countdown.start(duration), Start::Running(duration as u32));

            let mut expired = 0;
            let mut running = 0;
            for _ in 0..duration {
                match countdown.tick() {
                    Some(Tick::Running(_)) => running += 1,
                    Some(Tick::Expired) => expired += 1,
                    None => panic!("tick after expiry"),
                }
            }

            assert_eq!(countdown.remaining(), 0);
            assert_eq!(running, duration - 1);
            assert_eq!(expired, 1);
            assert!(countdown.tick().is_none());
            assert!(countdown.is_expired());
        }
    }

    #[test]
    fn non_positive_duration_expires_without_ticking() {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.start(0), Start::ExpiredImmediately);
        assert!(countdown.tick().is_none());
        assert_eq!(countdown.start(-5), Start::ExpiredImmediately);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn stop_freezes_and_restart_resets() {
        let mut countdown = Countdown::new();
        countdown.start(10);
        countdown.tick();
        countdown.stop();
        assert!(countdown.tick().is_none());
        assert_eq!(countdown.remaining(), 9);

        assert_eq!(countdown.start(3), Start::Running(3));
        assert_eq!(countdown.tick(), Some(Tick::Running(2)));
    }

    #[test]
    fn ticks_decrement_by_one() {
        let mut countdown = Countdown::new();
        countdown.start(3);
        assert_eq!(countdown.tick(), Some(Tick::Running(2)));
        assert_eq!(countdown.tick(), Some(Tick::Running(1)));
        assert_eq!(countdown.tick(), Some(Tick::Expired));
    }
}
