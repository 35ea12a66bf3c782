//! Logging macros for the kernel
//!
//! Thin wrappers over `defmt` so every core/sync module can log through
//! `crate::log::{debug,info,...}!` without sprinkling `#[cfg(feature =
//! "defmt")]` at every call site. No-ops when the feature is off.
//!
//! Plain (non-`#[macro_export]`) `macro_rules!`, re-exported with
//! `pub(crate) use` below: these are internal tracing, not part of the
//! kernel's public API, so they resolve through `crate::log::debug!` the
//! normal module-path way instead of polluting the crate root the way
//! `#[macro_export]` would.

/// Debug message
#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

/// Info message
#[cfg(feature = "defmt")]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

/// Error message
#[cfg(feature = "defmt")]
macro_rules! error {
    ($($arg:tt)*) => { defmt::error!($($arg)*) };
}

/// Trace message
#[cfg(feature = "defmt")]
macro_rules! trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}

/// Warning message
#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

// No-op versions when the defmt feature is disabled.
#[cfg(not(feature = "defmt"))]
macro_rules! debug { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "defmt"))]
macro_rules! info { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "defmt"))]
macro_rules! error { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "defmt"))]
macro_rules! trace { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "defmt"))]
macro_rules! warn { ($($arg:tt)*) => {}; }

pub(crate) use {debug, error, info, trace, warn};
