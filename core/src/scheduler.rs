//! Fixed-interval sample scheduling
//!
//! Elapsed time is computed with wrapping subtraction on a `u32` millisecond
//! counter, so the schedule stays correct across counter wraparound.

/// Gate that opens at most once per sampling interval
#[derive(Debug, Clone, Copy)]
pub struct SampleScheduler {
    interval_ms: u32,
    last_sample_ms: Option<u32>,
}

impl SampleScheduler {
    /// Create a scheduler that has never sampled; the first check is due
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_sample_ms: None,
        }
    }

    /// True if at least one interval has elapsed since the last sample
    pub fn due_for_sample(&self, now_ms: u32) -> bool {
        match self.last_sample_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.interval_ms,
        }
    }

    /// Start a new interval at `now_ms`
    pub fn mark_sampled(&mut self, now_ms: u32) {
        self.last_sample_ms = Some(now_ms);
    }

    pub fn last_sample_ms(&self) -> Option<u32> {
        self.last_sample_ms
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }
}
