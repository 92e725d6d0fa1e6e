//! GPIO adapters
//!
//! Embassy pins implement the `embedded-hal` 1.0 digital traits with an
//! infallible error type. These wrappers expose them through the
//! `dmcomm-hal` pin traits the protocol core is written against.

use core::convert::Infallible;

use embassy_rp::gpio::{Input, Output};
use embedded_hal::digital;

/// Output pin over any infallible `embedded-hal` output
pub struct HalOutput<P> {
    pin: P,
    high: bool,
}

impl<P: digital::OutputPin<Error = Infallible>> HalOutput<P> {
    /// Wrap a pin, driving it to `initial_high`
    pub fn new(mut pin: P, initial_high: bool) -> Self {
        let Ok(()) = if initial_high {
            pin.set_high()
        } else {
            pin.set_low()
        };
        Self {
            pin,
            high: initial_high,
        }
    }
}

impl<P: digital::OutputPin<Error = Infallible>> dmcomm_hal::OutputPin for HalOutput<P> {
    fn set_high(&mut self) {
        let Ok(()) = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let Ok(()) = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Input pin over any infallible `embedded-hal` input
pub struct HalInput<P> {
    pin: P,
}

impl<P: digital::InputPin<Error = Infallible>> HalInput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: digital::InputPin<Error = Infallible>> dmcomm_hal::InputPin for HalInput<P> {
    fn is_high(&mut self) -> bool {
        let Ok(high) = self.pin.is_high();
        high
    }
}

/// Push-pull RP2040 output
pub type RpOutput = HalOutput<Output<'static>>;

/// RP2040 digital input
pub type RpInput = HalInput<Input<'static>>;
