//! Countdown module - per-level timer driven by the host clock
//!
//! The countdown accumulates elapsed milliseconds and decrements once per
//! `COUNTDOWN_TICK_MS`. While frozen the ticks still fire but do not decrement.
//! Reaching zero stops the countdown; stopping is idempotent.

use crate::types::COUNTDOWN_TICK_MS;

/// Result of advancing the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// No whole second elapsed, the countdown is stopped, or it is frozen.
    Unchanged,
    /// One or more seconds were removed.
    Decremented,
    /// The countdown just reached zero and stopped itself.
    Expired,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    budget_secs: u32,
    remaining_secs: u32,
    carry_ms: u32,
    running: bool,
    frozen: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart from `budget_secs`, unfrozen.
    pub fn start(&mut self, budget_secs: u32) {
        self.budget_secs = budget_secs;
        self.remaining_secs = budget_secs;
        self.carry_ms = 0;
        self.running = true;
        self.frozen = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.carry_ms = 0;
    }

    /// Stop and forget the budget (menu state).
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn budget_secs(&self) -> u32 {
        self.budget_secs
    }

    /// Seconds consumed since the last start.
    pub fn elapsed_secs(&self) -> u32 {
        self.budget_secs.saturating_sub(self.remaining_secs)
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Milliseconds accumulated toward the next tick.
    pub fn carry_ms(&self) -> u32 {
        self.carry_ms
    }

    pub fn advance(&mut self, elapsed_ms: u32) -> CountdownStep {
        if !self.running {
            return CountdownStep::Unchanged;
        }

        self.carry_ms = self.carry_ms.saturating_add(elapsed_ms);
        let mut step = CountdownStep::Unchanged;

        while self.carry_ms >= COUNTDOWN_TICK_MS {
            self.carry_ms -= COUNTDOWN_TICK_MS;
            if self.frozen {
                continue;
            }

            self.remaining_secs = self.remaining_secs.saturating_sub(1);
            step = CountdownStep::Decremented;
            if self.remaining_secs == 0 {
                self.stop();
                return CountdownStep::Expired;
            }
        }

        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_countdown_is_stopped() {
        let mut c = Countdown::new();
        assert!(!c.running());
        assert_eq!(c.advance(5000), CountdownStep::Unchanged);
        assert_eq!(c.remaining_secs(), 0);
    }

    #[test]
    fn test_accumulates_partial_ticks() {
        let mut c = Countdown::new();
        c.start(40);
        assert_eq!(c.advance(600), CountdownStep::Unchanged);
        assert_eq!(c.remaining_secs(), 40);
        assert_eq!(c.advance(600), CountdownStep::Decremented);
        assert_eq!(c.remaining_secs(), 39);
        assert_eq!(c.carry_ms(), 200);
        assert_eq!(c.elapsed_secs(), 1);
    }

    #[test]
    fn test_expires_and_stops_itself() {
        let mut c = Countdown::new();
        c.start(2);
        assert_eq!(c.advance(1000), CountdownStep::Decremented);
        assert_eq!(c.advance(1000), CountdownStep::Expired);
        assert!(!c.running());
        assert_eq!(c.remaining_secs(), 0);
        assert_eq!(c.advance(1000), CountdownStep::Unchanged);
    }

    #[test]
    fn test_large_step_expires_once() {
        let mut c = Countdown::new();
        c.start(3);
        assert_eq!(c.advance(10_000), CountdownStep::Expired);
        assert_eq!(c.remaining_secs(), 0);
    }

    #[test]
    fn test_frozen_ticks_do_not_decrement() {
        let mut c = Countdown::new();
        c.start(10);
        c.advance(1000);
        c.freeze();
        assert_eq!(c.advance(5000), CountdownStep::Unchanged);
        assert_eq!(c.remaining_secs(), 9);
        assert!(c.running());
    }

    #[test]
    fn test_start_clears_freeze() {
        let mut c = Countdown::new();
        c.start(10);
        c.freeze();
        c.start(20);
        assert!(!c.frozen());
        assert_eq!(c.advance(1000), CountdownStep::Decremented);
        assert_eq!(c.remaining_secs(), 19);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut c = Countdown::new();
        c.start(10);
        c.stop();
        c.stop();
        assert!(!c.running());
        assert_eq!(c.remaining_secs(), 10);
    }
}
