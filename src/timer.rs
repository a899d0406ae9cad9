//! Whole-second timer used for both the per-exercise stopwatch and the
//! session countdown.
//!
//! The timer owns no thread. The caller advances it with [`Timer::tick`]
//! once per second while it is running; a count-down timer that reaches zero
//! stops itself and hands back [`TimerEvent::Expired`] from that tick.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    CountUp,
    CountDown { total: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    value: u64,
    running: bool,
    mode: TimerMode,
}

impl Timer {
    /// Stopwatch starting at zero, paused.
    pub fn count_up() -> Self {
        Self {
            value: 0,
            running: false,
            mode: TimerMode::CountUp,
        }
    }

    /// Countdown loaded with `total` seconds, paused.
    pub fn count_down(total: u64) -> Self {
        Self {
            value: total,
            running: false,
            mode: TimerMode::CountDown { total },
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Countdown capacity, `None` for a stopwatch.
    pub fn total(&self) -> Option<u64> {
        match self.mode {
            TimerMode::CountUp => None,
            TimerMode::CountDown { total } => Some(total),
        }
    }

    /// Seconds consumed so far. For a countdown this is `total - remaining`.
    pub fn elapsed(&self) -> u64 {
        match self.mode {
            TimerMode::CountUp => self.value,
            TimerMode::CountDown { total } => total.saturating_sub(self.value),
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        if matches!(self.mode, TimerMode::CountDown { .. }) && self.value == 0 {
            return;
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Set the current value without touching the running flag.
    /// Countdown values above the total are clamped to it.
    pub fn reset(&mut self, value: u64) {
        self.value = match self.mode {
            TimerMode::CountUp => value,
            TimerMode::CountDown { total } => value.min(total),
        };
    }

    /// Change a countdown's capacity, clamping the current value into range.
    /// No effect on a stopwatch.
    pub fn set_total(&mut self, total: u64) {
        if let TimerMode::CountDown { .. } = self.mode {
            self.mode = TimerMode::CountDown { total };
            self.value = self.value.min(total);
        }
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }

        match self.mode {
            TimerMode::CountUp => {
                self.value = self.value.saturating_add(1);
                None
            }
            TimerMode::CountDown { .. } => {
                self.value = self.value.saturating_sub(1);
                if self.value == 0 {
                    self.running = false;
                    Some(TimerEvent::Expired)
                } else {
                    None
                }
            }
        }
    }

    /// Share of a countdown still remaining, 0.0..=1.0. A stopwatch reports 1.0.
    pub fn remaining_ratio(&self) -> f64 {
        match self.mode {
            TimerMode::CountDown { total } if total > 0 => self.value as f64 / total as f64,
            TimerMode::CountDown { .. } => 0.0,
            TimerMode::CountUp => 1.0,
        }
    }

    pub fn formatted(&self) -> String {
        format_clock(self.value)
    }
}

/// `m:ss`, minutes unbounded.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
