//! Activity indicator boundary
//!
//! The front-end reports program lifecycle events here, typically to
//! blink an LED. Implementations must return quickly.

/// Receiver of program lifecycle events
pub trait Indicator {
    /// A new program was accepted
    fn on_new_program(&mut self) {}

    /// A command line was rejected
    fn on_new_program_rejected(&mut self) {}

    /// A program ran once
    fn on_program_executed(&mut self, _received: bool) {}
}

/// No indicator fitted
impl Indicator for () {}

/// Indicator that may not be fitted on every board
impl<I: Indicator> Indicator for Option<I> {
    fn on_new_program(&mut self) {
        if let Some(i) = self {
            i.on_new_program();
        }
    }

    fn on_new_program_rejected(&mut self) {
        if let Some(i) = self {
            i.on_new_program_rejected();
        }
    }

    fn on_program_executed(&mut self, received: bool) {
        if let Some(i) = self {
            i.on_program_executed(received);
        }
    }
}
