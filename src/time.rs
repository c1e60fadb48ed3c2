//! Time APIs for obtaining the current time and performing short delays.
//!
//! These APIs are made for the mesh networking core and are not meant to be
//! general-purpose. Millisecond resolution is all the send-path and ack
//! timing budgets need.

/// Trait for time providers.
///
/// The platform has to provide an implementation of `Clock` to the stack.
/// `millis` must be monotonic (never move backwards except on wraparound);
/// `delay_ms` blocks the caller for approximately the given duration.
///
/// This trait can also be implemented by a mock clock for testing.
pub trait Clock {
    /// Milliseconds since some arbitrary epoch fixed at startup.
    fn millis(&self) -> u32;

    /// Busy-wait (or yield, depending on the platform) for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}
