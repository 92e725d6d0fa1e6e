//! Time source abstraction
//!
//! The link protocol measures pulse widths by busy-polling a monotonic
//! microsecond counter. Everything timing-related goes through [`Clock`]
//! so the protocol can be driven by a fake clock in tests.

/// Monotonic time source
pub trait Clock {
    /// Microseconds since an arbitrary epoch
    ///
    /// Wraps at `u32::MAX`; callers compare with `wrapping_sub`.
    fn now_micros(&self) -> u32;

    /// Milliseconds since an arbitrary epoch
    ///
    /// Must also wrap at `u32::MAX`, so derive it from a counter wider
    /// than the microsecond one. `now_micros() / 1000` wraps after about
    /// 71 minutes and breaks deadline arithmetic.
    fn now_millis(&self) -> u32;

    /// Give other work a chance to run during a long wait
    ///
    /// Only called when the remaining wait is coarse (hundreds of
    /// milliseconds), never inside bit-level timing.
    fn yield_now(&self) {}

    /// Busy-wait for `us` microseconds
    fn delay_micros(&self, us: u32) {
        let start = self.now_micros();
        while self.now_micros().wrapping_sub(start) < us {}
    }

    /// Wait for `ms` milliseconds, yielding while doing so
    fn delay_millis(&self, ms: u32) {
        let start = self.now_millis();
        while self.now_millis().wrapping_sub(start) < ms {
            self.yield_now();
        }
    }
}
