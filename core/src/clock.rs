//! Tick clock: owns the cycle counter and the fixed cycle interval.

use crate::types::Cycle;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TickClock {
    pub current_cycle: Cycle,
    interval:          Duration,
    next_deadline:     Option<Instant>,
}

impl TickClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            current_cycle: 0,
            interval,
            next_deadline: None,
        }
    }

    /// Advance one cycle. Returns the new cycle number.
    pub fn advance(&mut self) -> Cycle {
        self.current_cycle += 1;
        self.current_cycle
    }

    /// Sleep out the rest of the current interval.
    ///
    /// If a cycle overran its slot the schedule restarts from now instead of
    /// firing back-to-back cycles to catch up.
    pub fn sleep_until_next(&mut self) {
        let now = Instant::now();
        let deadline = match self.next_deadline {
            Some(d) if d > now => d,
            _ => now + self.interval,
        };
        std::thread::sleep(deadline.saturating_duration_since(now));
        self.next_deadline = Some(deadline + self.interval);
    }
}
