//! Analog input abstraction
//!
//! Some prong circuits sense the line through an ADC channel so the
//! logic threshold can be moved per dialect instead of relying on the
//! chip's fixed digital input thresholds.

/// Analog voltage input
pub trait AnalogInput {
    /// Sample the input and return the voltage in millivolts
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read_millivolts(&mut self) -> u16;
}

/// Raw ADC channel
///
/// Returns unscaled conversion counts. Drivers turn these into
/// millivolts for an [`AnalogInput`].
pub trait RawAdc {
    /// Perform one conversion
    fn read_raw(&mut self) -> u16;
}

/// Placeholder for boards without an analog sense input
#[derive(Debug)]
pub enum NoAnalog {}

impl AnalogInput for NoAnalog {
    fn read_millivolts(&mut self) -> u16 {
        match *self {}
    }
}
