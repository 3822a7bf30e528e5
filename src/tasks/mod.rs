//! Background polling loops.
//!
//! Both loops share one shape: query once on activation, then once per
//! interval, log and retry failures at the same pace, and drop any result
//! that lands after the loop was stopped or restarted. Limits bound how long
//! a forgotten loop keeps hitting the backend.

pub mod order_monitor;
pub mod ticket_poller;

pub use order_monitor::*;
pub use ticket_poller::*;

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollLimits {
    pub max_attempts: Option<u32>,
    pub max_duration: Option<Duration>,
}

impl PollLimits {
    pub const UNBOUNDED: PollLimits = PollLimits {
        max_attempts: None,
        max_duration: None,
    };

    pub fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    pub fn time_exhausted(&self, elapsed: Duration) -> bool {
        self.max_duration.is_some_and(|max| elapsed >= max)
    }
}
