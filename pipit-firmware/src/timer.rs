use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TimerState {
    Disabled,
    Running { start: Instant, value: Duration },
    Expired,
}

/// A one-shot countdown measured against the tick clock. The clock is never read here; every
/// query is given the `now` sampled once per tick so all timers agree within a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timer {
    state: TimerState,
    default_value: Duration,
}

impl Timer {
    pub const fn new(default_value: Duration) -> Self {
        Self {
            state: TimerState::Disabled,
            default_value,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.start_with(now, self.default_value);
    }

    pub fn start_with(&mut self, now: Instant, value: Duration) {
        self.state = TimerState::Running { start: now, value };
    }

    pub fn disable(&mut self) {
        self.state = TimerState::Disabled;
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.state, TimerState::Disabled)
    }

    /// Returns true once when the timer has run out; the timer is then disabled.
    pub fn is_done(&mut self, now: Instant) -> bool {
        let done = self.peek_done(now);
        if done {
            self.disable();
        }
        done
    }

    pub fn peek_done(&self, now: Instant) -> bool {
        match self.state {
            TimerState::Disabled => false,
            TimerState::Expired => true,
            TimerState::Running { start, value } => now.saturating_duration_since(start) >= value,
        }
    }

    pub fn is_running(&self, now: Instant) -> bool {
        matches!(self.state, TimerState::Running { .. }) && !self.peek_done(now)
    }

    pub fn force_done(&mut self) {
        self.state = TimerState::Expired;
    }

    pub fn set_default(&mut self, value: Duration) {
        self.default_value = value;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.state {
            TimerState::Running { start, .. } => now.saturating_duration_since(start),
            TimerState::Disabled | TimerState::Expired => Duration::from_ticks(0),
        }
    }

    /// Move the start back so the timer runs out `by` sooner.
    pub fn jump_ahead(&mut self, by: Duration) {
        if let TimerState::Running { start, value } = self.state {
            self.state = TimerState::Running {
                start: start.checked_sub(by).unwrap_or(Instant::from_ticks(0)),
                value,
            };
        }
    }
}

#[cfg(test)]
#[path = "timer_test.rs"]
mod test;
