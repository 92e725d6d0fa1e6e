//! GPIO activity LED
//!
//! Lit while a program is loaded and its last run heard the other side.
//! Goes dark when a line is rejected or a run received nothing.

use dmcomm_core::indicator::Indicator;
use dmcomm_hal::OutputPin;

/// Indicator driving a single LED
pub struct LedIndicator<P> {
    pin: P,
    /// If true, LED on = pin LOW
    inverted: bool,
    lit: bool,
}

impl<P: OutputPin> LedIndicator<P> {
    /// Create the indicator with the LED off
    ///
    /// `inverted` is for LEDs wired to the supply, lit by pulling low.
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut led = Self {
            pin,
            inverted,
            lit: false,
        };
        led.set(false);
        led
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn set(&mut self, lit: bool) {
        self.lit = lit;
        if lit != self.inverted {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}

impl<P: OutputPin> Indicator for LedIndicator<P> {
    fn on_new_program(&mut self) {
        self.set(true);
    }

    fn on_new_program_rejected(&mut self) {
        self.set(false);
    }

    fn on_program_executed(&mut self, received: bool) {
        self.set(received);
    }
}
