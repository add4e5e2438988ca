//! Round countdown

/// Default round budget in seconds
pub const DEFAULT_ROUND_SECONDS: u32 = 150;

/// One-tick-per-second countdown. Never goes below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            remaining: budget,
            running: false,
        }
    }

    /// Reset to the full budget and start counting.
    pub fn start(&mut self) {
        self.remaining = self.budget;
        self.running = self.budget > 0;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one second. Returns true on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Seconds consumed since the last start.
    pub fn elapsed(&self) -> u32 {
        self.budget - self.remaining
    }
}

/// Format seconds as M:SS
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
