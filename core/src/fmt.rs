//! Logging shim
//!
//! Forwards to `defmt` on firmware builds and to `log` on host builds.
//! With neither feature enabled the macros evaluate their arguments and
//! discard them. Format strings must stay within the subset both backends
//! accept: `{}` and `{:?}` without width or precision.
#![allow(unused_macros)]

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
}
#[cfg(feature = "defmt")]
macro_rules! info {
    ($($arg:tt)*) => { ::defmt::info!($($arg)*) };
}
#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
}
#[cfg(feature = "defmt")]
macro_rules! error {
    ($($arg:tt)*) => { ::defmt::error!($($arg)*) };
}

#[cfg(all(not(feature = "defmt"), feature = "log"))]
macro_rules! debug {
    ($($arg:tt)*) => { ::log::debug!($($arg)*) };
}
#[cfg(all(not(feature = "defmt"), feature = "log"))]
macro_rules! info {
    ($($arg:tt)*) => { ::log::info!($($arg)*) };
}
#[cfg(all(not(feature = "defmt"), feature = "log"))]
macro_rules! warn {
    ($($arg:tt)*) => { ::log::warn!($($arg)*) };
}
#[cfg(all(not(feature = "defmt"), feature = "log"))]
macro_rules! error {
    ($($arg:tt)*) => { ::log::error!($($arg)*) };
}

#[cfg(all(not(feature = "defmt"), not(feature = "log")))]
macro_rules! debug {
    ($($arg:tt)*) => {{ let _ = ($($arg)*); }};
}
#[cfg(all(not(feature = "defmt"), not(feature = "log")))]
macro_rules! info {
    ($($arg:tt)*) => {{ let _ = ($($arg)*); }};
}
#[cfg(all(not(feature = "defmt"), not(feature = "log")))]
macro_rules! warn {
    ($($arg:tt)*) => {{ let _ = ($($arg)*); }};
}
#[cfg(all(not(feature = "defmt"), not(feature = "log")))]
macro_rules! error {
    ($($arg:tt)*) => {{ let _ = ($($arg)*); }};
}

/// Wrapper that logs a value through its `Debug` impl on every backend
#[cfg(feature = "defmt")]
pub(crate) use defmt::Debug2Format;

#[cfg(not(feature = "defmt"))]
pub(crate) struct Debug2Format<'a, T: core::fmt::Debug + ?Sized>(pub &'a T);

#[cfg(not(feature = "defmt"))]
impl<T: core::fmt::Debug + ?Sized> core::fmt::Debug for Debug2Format<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
