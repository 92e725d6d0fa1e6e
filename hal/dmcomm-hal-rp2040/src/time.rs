//! Clock on the embassy time driver
//!
//! The RP2040 time driver ticks at 1 MHz, so `Instant` already has
//! microsecond resolution.

use embassy_time::Instant;

use dmcomm_hal::Clock;

/// Monotonic clock backed by `embassy-time`
///
/// The protocol code is synchronous, so [`Clock::yield_now`] keeps its
/// default no-op and long waits simply spin. A listen of several seconds
/// therefore holds the executor for its whole length.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_micros(&self) -> u32 {
        Instant::now().as_micros() as u32
    }

    // From the 64-bit tick count, so it wraps at u32::MAX
    fn now_millis(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
