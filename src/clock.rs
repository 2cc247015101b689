use std::time::{Duration, Instant};

/// Monotonic time as an offset from a fixed origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for stepping frames in tests.
#[cfg(test)]
#[derive(Default)]
pub struct ManualClock {
    now: std::cell::Cell<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Hands out one frame per interval, the terminal's stand-in for a display
/// refresh callback. Once cancelled it never fires again.
#[derive(Debug)]
pub struct FrameScheduler {
    interval: Duration,
    next_due: Option<Duration>,
}

impl FrameScheduler {
    pub fn new(hz: f32, now: Duration) -> Self {
        Self {
            interval: Duration::from_nanos((1.0e9 / hz.max(1.0)) as u64),
            next_due: Some(now),
        }
    }

    /// True when a frame should run at `now`. Late frames are not made up;
    /// the next one is scheduled from `now`.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let next = due + self.interval;
                self.next_due = Some(if next > now { next } else { now + self.interval });
                true
            }
            _ => false,
        }
    }

    /// Time left until the next frame, or `None` once cancelled.
    pub fn until_due(&self, now: Duration) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_sub(now))
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }
}
