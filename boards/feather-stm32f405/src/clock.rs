#![deny(unsafe_code)]
//! Uptime clock

use embassy_time::Instant;
use hal_abstractions::Clock;

/// Milliseconds since boot, truncated to wrap at `u32::MAX`
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
