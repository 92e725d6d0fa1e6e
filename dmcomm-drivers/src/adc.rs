//! ADC scaling
//!
//! The prong's sense resistor network feeds an ADC channel directly, so
//! millivolts are a linear function of the conversion count:
//! `mv = raw * reference_mv / full_scale`.

use dmcomm_hal::{AnalogInput, RawAdc};

/// Default RP2040 ADC resolution
pub const DEFAULT_RESOLUTION_BITS: u8 = 12;

/// Analog input built from a raw ADC channel
pub struct ScaledAdc<R> {
    adc: R,
    reference_mv: u16,
    resolution_bits: u8,
}

impl<R: RawAdc> ScaledAdc<R> {
    /// 12-bit conversion against `reference_mv`
    pub fn new(adc: R, reference_mv: u16) -> Self {
        Self::with_resolution(adc, reference_mv, DEFAULT_RESOLUTION_BITS)
    }

    /// # Panics
    ///
    /// If `resolution_bits` is not in `1..=16`.
    pub fn with_resolution(adc: R, reference_mv: u16, resolution_bits: u8) -> Self {
        assert!((1..=16).contains(&resolution_bits), "bad ADC resolution");
        Self {
            adc,
            reference_mv,
            resolution_bits,
        }
    }

    /// Convert a raw count, clamping counts above full scale
    pub fn scale(&self, raw: u16) -> u16 {
        let full_scale = (1u32 << self.resolution_bits) - 1;
        let raw = (raw as u32).min(full_scale);
        (raw * self.reference_mv as u32 / full_scale) as u16
    }
}

impl<R: RawAdc> AnalogInput for ScaledAdc<R> {
    fn read_millivolts(&mut self) -> u16 {
        let raw = self.adc.read_raw();
        self.scale(raw)
    }
}
