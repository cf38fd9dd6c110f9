//! Monotonic time source

/// Monotonic millisecond clock
///
/// The counter is free-running and wraps at `u32::MAX` (about 49.7 days).
/// Consumers must compare timestamps with wrapping subtraction.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
