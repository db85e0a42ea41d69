/// Tick source: a repeating timer with exactly one live handle.
///
/// Re-arming always cancels the previous handle first, so ticks never
/// stack and a superseded timer can never fire. Callers pass `now`
/// explicitly; the main loop uses `Instant::now()`, tests use offsets.

use std::time::{Duration, Instant};

/// Identity of one armed timer. Stale handles compare unequal to the
/// scheduler's current generation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimerHandle {
    generation: u64,
}

#[derive(Clone, Copy, Debug)]
struct LiveTimer {
    handle: TimerHandle,
    interval: Duration,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct TickScheduler {
    live: Option<LiveTimer>,
    generation: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        TickScheduler { live: None, generation: 0 }
    }

    /// Cancel whatever is armed and schedule a fresh repeating timer
    /// whose first tick is `interval` after `now`.
    pub fn arm(&mut self, interval: Duration, now: Instant) -> TimerHandle {
        self.cancel();
        self.generation += 1;
        let handle = TimerHandle { generation: self.generation };
        self.live = Some(LiveTimer {
            handle,
            interval,
            deadline: now + interval,
        });
        handle
    }

    /// Invalidate the live handle, if any.
    pub fn cancel(&mut self) {
        self.live = None;
    }

    /// Has the live timer reached its deadline? Fires at most once per
    /// call and moves the deadline forward by one interval. When the loop
    /// has fallen more than an interval behind, the next deadline is
    /// measured from `now` instead of firing a burst of catch-up ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        let timer = match self.live.as_mut() {
            Some(t) => t,
            None => return false,
        };
        if now < timer.deadline {
            return false;
        }
        let next = timer.deadline + timer.interval;
        timer.deadline = if next <= now { now + timer.interval } else { next };
        true
    }

    pub fn is_armed(&self) -> bool {
        self.live.is_some()
    }

    #[cfg(test)]
    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.live.map_or(false, |t| t.handle == handle)
    }

    #[cfg(test)]
    pub fn interval(&self) -> Option<Duration> {
        self.live.map(|t| t.interval)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
